//! # oxide-modeldb
//!
//! Struct-to-row mapping over sqlx, with transactions that retry on
//! serialization conflicts.
//!
//! This crate provides:
//! - [`ModelDb`], a pooled handle running statements written with `?`
//!   placeholders against PostgreSQL or SQLite
//! - Record arguments and destinations: a whole record binds as its
//!   insertable columns and reads back from one column per mapped field
//! - [`ModelConn`], implemented by both [`ModelDb`] and [`ModelTx`], so
//!   helpers run against the pool or inside a transaction
//! - [`ModelDb::do_begin`], which reruns a unit of work until it commits
//!   without a serialization conflict
//! - An error taxonomy ([`ErrorKind`]) separating duplicate entries,
//!   conflicts, malformed statements and mapping mistakes
//!
//! `#[derive(Model)]` expands to paths in `oxide_modeldb_core`, so crates
//! deriving records depend on both crates.
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxide_modeldb::{Arg, DbConfig, Dest, IsolationLevel, Model, ModelDb};
//!
//! #[derive(Debug, Default, Model)]
//! struct User {
//!     #[db("id,autoinc")]
//!     id: i64,
//!     #[db("email,null")]
//!     email: String,
//!     #[db("token")]
//!     token: String,
//! }
//!
//! # async fn example() -> oxide_modeldb::Result<()> {
//! let db = ModelDb::connect(&DbConfig::new("sqlite::memory:")).await?;
//!
//! let info = User::model_info()?;
//! let insert = format!(
//!     "INSERT INTO {} ({}) VALUES ({})",
//!     info.table_name, info.fields_insert, info.placeholders
//! );
//! let user = User {
//!     token: String::from("abc"),
//!     ..User::default()
//! };
//! db.exec(&insert, &[Arg::record(&user)]).await?;
//!
//! let select = format!("SELECT {} FROM user WHERE token = ?", info.fields_simple);
//! let loaded: User = db.query_one(&select, &["abc".into()]).await?;
//!
//! let mut count = 0_i64;
//! db.query_row("SELECT COUNT(*) FROM user", &[])
//!     .await?
//!     .scan(&mut [Dest::scalar(&mut count)])?;
//!
//! db.do_begin(IsolationLevel::Serializable, |tx| {
//!     Box::pin(async move {
//!         tx.exec("DELETE FROM user WHERE token = ?", &["abc".into()]).await?;
//!         Ok(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod conn;
pub mod db;
pub mod dialect;
pub mod error;
mod query;
pub mod retry;
pub mod rows;
pub mod tx;

pub use config::DbConfig;
pub use conn::ModelConn;
pub use db::ModelDb;
pub use dialect::{Dialect, ErrorClass, IsolationLevel, PostgresDialect, SqliteDialect};
pub use error::{Error, ErrorKind, Result, classify};
pub use retry::{Transactional, TxBegin};
pub use rows::{ModelRow, ModelRows};
pub use tx::ModelTx;

pub use oxide_modeldb_core::{
    Arg, Dest, FieldInfo, MappingError, Model, ModelInfo, ParseError, Record, Registry, SqlKind,
    SqlValue, translate,
};
pub use oxide_modeldb_derive::Model;
