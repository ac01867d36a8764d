//! # oxide-modeldb-core
//!
//! Backend-independent building blocks for mapping Rust structs to SQL rows.
//!
//! This crate provides:
//! - A placeholder translator rewriting `?` markers into `$1`, `$2`, ...
//! - A registry of per-type record descriptors with ready-made column lists
//! - Argument expansion, flattening records into positional values
//! - Row materialization into scalar slots and records
//!
//! ## Records
//!
//! Records are plain structs deriving `Model` (re-exported by the
//! `oxide-modeldb` crate). Each mapped field names its column, optionally
//! followed by `null` and `autoinc`:
//!
//! ```rust
//! use oxide_modeldb_core::{Model, Registry};
//! use oxide_modeldb_derive::Model;
//!
//! #[derive(Debug, Default, Model)]
//! struct User {
//!     #[db("id,autoinc")]
//!     id: i64,
//!     #[db("email,null")]
//!     email: String,
//!     #[db("token")]
//!     token: String,
//!     // Unmapped
//!     session: Option<String>,
//! }
//!
//! let info = Registry::global().describe::<User>().unwrap();
//! assert_eq!(info.fields_simple, "id, email, token");
//! assert_eq!(info.fields_insert, "email, token");
//! assert_eq!(info.placeholders, "?, ?");
//! ```
//!
//! ## Placeholders
//!
//! ```rust
//! use oxide_modeldb_core::placeholder::translate;
//!
//! assert_eq!(translate("a=? AND b='?'").unwrap(), "a=$1 AND b='?'");
//! ```

pub mod args;
pub mod error;
pub mod placeholder;
pub mod registry;
pub mod row;
pub mod schema;
pub mod value;

pub use args::{Arg, expand_args};
pub use error::{MappingError, Result, ValueError};
pub use placeholder::{ParseError, translate, translate_cached};
pub use registry::{FieldInfo, ModelInfo, Registry};
pub use row::{Dest, ScalarSlot, ScanTarget, Scanner, materialize, plan_targets};
pub use schema::{FieldDef, Model, ModelDef, Record};
pub use value::{FromSqlValue, SqlKind, SqlType, SqlValue, ToSqlValue};
