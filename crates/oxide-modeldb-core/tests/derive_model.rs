//! Tests for the `#[derive(Model)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - a `ModelDef` listing only annotated fields, in declaration order
//! - `Record` accessors that read and write those fields by position
//! - descriptors whose derived column strings line up

use oxide_modeldb_core::{
    Arg, Dest, FieldDef, MappingError, Model, Record, Registry, ScanTarget, Scanner, SqlKind,
    SqlValue, ValueError, expand_args, materialize,
};
use oxide_modeldb_derive::Model;

// =============================================================================
// Test: Basic record with autoincrement and nullable fields
// =============================================================================

#[derive(Debug, Default, Model)]
pub struct User {
    #[db("id,autoinc")]
    pub id: i64,
    #[db("email,null")]
    pub email: String,
    #[db("token")]
    pub token: String,
    pub cached_display_name: Option<String>,
}

#[test]
fn test_user_model_def() {
    let def = User::DEF;
    assert_eq!(def.type_name, "User");
    assert_eq!(def.table, None);
    assert_eq!(
        def.fields,
        &[
            FieldDef::new("id", "id", SqlKind::Int).autoincrement(),
            FieldDef::new("email", "email", SqlKind::Text).nullable(),
            FieldDef::new("token", "token", SqlKind::Text),
        ]
    );
}

#[test]
fn test_user_descriptor_strings() {
    let info = Registry::new().describe::<User>().unwrap();
    assert_eq!(info.table_name, "user");
    assert_eq!(info.fields_simple, "id, email, token");
    assert_eq!(info.fields_prefixed, "user.id, user.email, user.token");
    assert_eq!(info.fields_insert, "email, token");
    assert_eq!(info.placeholders, "?, ?");
}

#[test]
fn test_unmapped_field_is_ignored() {
    let user = User {
        id: 1,
        email: String::from("a@b.c"),
        token: String::from("t"),
        cached_display_name: Some(String::from("ignored")),
    };
    assert_eq!(user.field_values().len(), 3);
}

#[test]
fn test_set_field_by_position() {
    let mut user = User::default();
    user.set_field(0, SqlValue::Int(5)).unwrap();
    user.set_field(2, SqlValue::Text(String::from("xyz"))).unwrap();
    assert_eq!(user.id, 5);
    assert_eq!(user.token, "xyz");

    let err = user.set_field(3, SqlValue::Null).unwrap_err();
    assert_eq!(err, ValueError::UnknownField { index: 3 });
}

#[test]
fn test_insert_args_from_derived_record() {
    let registry = Registry::new();
    let user = User {
        id: 99,
        email: String::new(),
        token: String::from("secret"),
        cached_display_name: None,
    };
    let values = expand_args(&registry, &[Arg::record(&user)]).unwrap();
    assert_eq!(
        values,
        vec![SqlValue::Null, SqlValue::Text(String::from("secret"))]
    );
}

// =============================================================================
// Test: Table override and Option fields
// =============================================================================

#[derive(Debug, Default, Model)]
#[table(name = "audit_entries")]
pub struct AuditEntry {
    #[db("entry_id,autoinc")]
    pub id: i64,
    #[db("actor")]
    pub actor: String,
    #[db("score")]
    pub score: Option<i32>,
    #[db("payload,null")]
    pub payload: Vec<u8>,
    #[db("flagged")]
    pub flagged: bool,
}

#[test]
fn test_table_override() {
    assert_eq!(AuditEntry::DEF.table, Some("audit_entries"));
    let info = Registry::new().describe::<AuditEntry>().unwrap();
    assert_eq!(info.table_name, "audit_entries");
    assert_eq!(
        info.fields_prefixed,
        "audit_entries.entry_id, audit_entries.actor, audit_entries.score, \
         audit_entries.payload, audit_entries.flagged"
    );
}

#[test]
fn test_option_field_accepts_null() {
    let score = &AuditEntry::DEF.fields[2];
    assert!(score.optional);
    assert!(!score.nullable);
    assert!(score.accepts_null());
    assert_eq!(score.kind, SqlKind::Int);
}

#[test]
fn test_option_zero_is_inserted_as_value() {
    let entry = AuditEntry {
        score: Some(0),
        ..AuditEntry::default()
    };
    let values = expand_args(&Registry::new(), &[Arg::record(&entry)]).unwrap();
    assert_eq!(values[1], SqlValue::Int(0));
    // Declared nullable and empty.
    assert_eq!(values[2], SqlValue::Null);
}

#[test]
fn test_rust_identifier_differs_from_column() {
    let info = Registry::new().describe::<AuditEntry>().unwrap();
    assert_eq!(info.fields[0].ident, "id");
    assert_eq!(info.fields[0].column, "entry_id");
    assert_eq!(info.fields_insert, "actor, score, payload, flagged");
    assert_eq!(info.placeholders, "?, ?, ?, ?");
}

// =============================================================================
// Test: Materializing a derived record
// =============================================================================

struct FixedRow(Vec<SqlValue>);

impl Scanner for FixedRow {
    type Error = MappingError;

    fn scan(&self, targets: &[ScanTarget]) -> Result<Vec<SqlValue>, MappingError> {
        for (target, value) in targets.iter().zip(&self.0) {
            assert!(target.is_nullable() || !value.is_null());
        }
        Ok(self.0.clone())
    }
}

#[test]
fn test_materialize_derived_record() {
    let registry = Registry::new();
    let row = FixedRow(vec![
        SqlValue::Int(12),
        SqlValue::Text(String::from("root")),
        SqlValue::Null,
        SqlValue::Null,
        SqlValue::Int(1),
    ]);
    let mut entry = AuditEntry {
        score: Some(4),
        ..AuditEntry::default()
    };
    materialize(&registry, &row, &mut [Dest::record(&mut entry)]).unwrap();

    assert_eq!(entry.id, 12);
    assert_eq!(entry.actor, "root");
    assert_eq!(entry.score, None);
    assert!(entry.payload.is_empty());
    assert!(entry.flagged);
}

// =============================================================================
// Test: Generated keys and declared-null Option fields
// =============================================================================

#[derive(Debug, Default, Model)]
pub struct Score {
    #[db("id,autoinc")]
    pub id: Option<i64>,
    #[db("points,null")]
    pub points: Option<i64>,
    #[db("note,null")]
    pub note: Option<String>,
}

#[test]
fn test_option_autoincrement_key_is_accepted() {
    let info = Registry::new().describe::<Score>().unwrap();
    assert!(info.fields[0].autoincrement);
    assert!(info.fields[0].accepts_null());
    assert_eq!(info.fields_insert, "points, note");
}

#[test]
fn test_declared_null_option_keeps_present_zero() {
    let score = Score {
        id: Some(3),
        points: Some(0),
        note: Some(String::new()),
    };
    assert_eq!(score.zero_fields(), vec![false, false, false]);
    let values = expand_args(&Registry::new(), &[Arg::record(&score)]).unwrap();
    assert_eq!(
        values,
        vec![SqlValue::Int(0), SqlValue::Text(String::new())]
    );

    let values = expand_args(&Registry::new(), &[Arg::record(&Score::default())]).unwrap();
    assert_eq!(values, vec![SqlValue::Null, SqlValue::Null]);
}

// =============================================================================
// Test: Records without mapped fields
// =============================================================================

#[derive(Debug, Default, Model)]
pub struct Unmapped {
    pub note: String,
}

#[test]
fn test_record_without_mapped_fields_is_rejected() {
    let err = Registry::new().describe::<Unmapped>().unwrap_err();
    assert_eq!(err, MappingError::NoMappedFields { model: "Unmapped" });
}
