//! The record metadata registry.
//!
//! A [`ModelInfo`] is built once per record type from its static
//! [`ModelDef`], validated, and cached under the type name for the process
//! lifetime. The build runs under the registry's write lock, so a reader
//! observes either no entry or a complete one.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

use crate::args::Arg;
use crate::error::{MappingError, Result};
use crate::schema::{Model, ModelDef, Record};
use crate::value::SqlKind;

/// Descriptor of one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Position in the record's mapped fields.
    pub index: usize,
    /// The Rust field identifier.
    pub ident: &'static str,
    /// The SQL column name.
    pub column: &'static str,
    /// Whether the column was declared to hold NULL.
    pub nullable: bool,
    /// Whether the field type holds NULL itself.
    pub optional: bool,
    /// Whether the database generates the value.
    pub autoincrement: bool,
    /// The field's scalar kind.
    pub kind: SqlKind,
}

impl FieldInfo {
    /// Returns true if the field is scanned through a nullable target.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        self.nullable || self.optional
    }
}

/// Descriptor of a record type.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    type_id: TypeId,
    /// The Rust type name.
    pub type_name: &'static str,
    /// The table name.
    pub table_name: String,
    /// Mapped fields in definition order.
    pub fields: Vec<FieldInfo>,
    /// All columns, for SELECT lists: `id, email, token`.
    pub fields_simple: String,
    /// All columns qualified by table: `user.id, user.email, user.token`.
    pub fields_prefixed: String,
    /// Columns written by INSERT (autoincrement excluded): `email, token`.
    pub fields_insert: String,
    /// One marker per insertable column: `?, ?`.
    pub placeholders: String,
}

impl ModelInfo {
    fn build(def: &'static ModelDef, type_id: TypeId) -> Result<Self> {
        let model = def.type_name;
        if def.fields.is_empty() {
            return Err(MappingError::NoMappedFields { model });
        }

        let invalid = |field: &'static str, reason: &'static str| MappingError::InvalidField {
            model,
            field,
            reason,
        };

        let mut fields = Vec::with_capacity(def.fields.len());
        for (index, field) in def.fields.iter().enumerate() {
            if field.column.is_empty() {
                return Err(invalid(field.ident, "empty column name"));
            }
            if field.nullable && field.autoincrement {
                return Err(invalid(field.ident, "autoincrement field cannot be nullable"));
            }
            if def.fields[..index].iter().any(|f| f.column == field.column) {
                return Err(invalid(field.ident, "duplicate column name"));
            }
            fields.push(FieldInfo {
                index,
                ident: field.ident,
                column: field.column,
                nullable: field.nullable,
                optional: field.optional,
                autoincrement: field.autoincrement,
                kind: field.kind,
            });
        }

        let table_name = def.table_name();
        let columns: Vec<&str> = fields.iter().map(|f| f.column).collect();
        let prefixed: Vec<String> = columns
            .iter()
            .map(|c| format!("{table_name}.{c}"))
            .collect();
        let insert: Vec<&str> = fields
            .iter()
            .filter(|f| !f.autoincrement)
            .map(|f| f.column)
            .collect();
        let placeholders = vec!["?"; insert.len()];

        Ok(Self {
            type_id,
            type_name: model,
            fields_simple: columns.join(", "),
            fields_prefixed: prefixed.join(", "),
            fields_insert: insert.join(", "),
            placeholders: placeholders.join(", "),
            table_name,
            fields,
        })
    }

    /// Returns the `TypeId` of the record type this descriptor was built for.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fields written by INSERT, in order.
    pub fn insertable(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| !f.autoincrement)
    }

    /// Returns the number of fields written by INSERT.
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.insertable().count()
    }

    /// Returns the number of fields that accept NULL.
    #[must_use]
    pub fn nullable_count(&self) -> usize {
        self.fields.iter().filter(|f| f.accepts_null()).count()
    }

    /// Checks that `record` is an instance of the described type.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::TypeMismatch`] otherwise.
    pub fn check_type(&self, record: &dyn Record) -> Result<()> {
        if record.as_any().type_id() == self.type_id {
            Ok(())
        } else {
            Err(MappingError::TypeMismatch {
                model: self.type_name,
            })
        }
    }
}

/// Append-only cache of record descriptors, keyed by type name.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<&'static str, Arc<ModelInfo>>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Returns the descriptor of `M`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`MappingError`] if the metadata is invalid, or if another
    /// type with the same name was described first.
    pub fn describe<M: Model>(&self) -> Result<Arc<ModelInfo>> {
        self.describe_def(M::DEF, TypeId::of::<M>())
    }

    /// Returns the descriptor of a record's runtime type.
    ///
    /// # Errors
    ///
    /// See [`Registry::describe`].
    pub fn describe_record(&self, record: &dyn Record) -> Result<Arc<ModelInfo>> {
        self.describe_def(record.model_def(), record.as_any().type_id())
    }

    /// Returns the descriptor of a record argument, or `None` for a scalar.
    ///
    /// # Errors
    ///
    /// See [`Registry::describe`].
    pub fn describe_arg(&self, arg: &Arg<'_>) -> Result<Option<Arc<ModelInfo>>> {
        match arg {
            Arg::Value(_) => Ok(None),
            Arg::Record(record) => self.describe_record(*record).map(Some),
        }
    }

    /// Returns the number of cached descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing has been described yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn describe_def(&self, def: &'static ModelDef, type_id: TypeId) -> Result<Arc<ModelInfo>> {
        let cached = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(def.type_name)
            .cloned();
        let info = match cached {
            Some(info) => info,
            None => {
                let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
                if let Some(info) = models.get(def.type_name) {
                    Arc::clone(info)
                } else {
                    let info = Arc::new(ModelInfo::build(def, type_id)?);
                    debug!(
                        model = info.type_name,
                        table = %info.table_name,
                        columns = info.fields.len(),
                        "Built model descriptor"
                    );
                    models.insert(def.type_name, Arc::clone(&info));
                    info
                }
            }
        };

        if info.type_id == type_id {
            Ok(info)
        } else {
            Err(MappingError::TypeMismatch {
                model: def.type_name,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;
    use crate::schema::FieldDef;
    use crate::value::{FromSqlValue, SqlValue, ToSqlValue};
    use std::any::Any;

    #[derive(Debug, Default)]
    struct Ticket {
        id: i64,
        email: String,
        token: String,
    }

    impl Record for Ticket {
        fn model_def(&self) -> &'static ModelDef {
            Self::DEF
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn field_values(&self) -> Vec<SqlValue> {
            vec![
                self.id.to_sql_value(),
                self.email.to_sql_value(),
                self.token.to_sql_value(),
            ]
        }

        fn set_field(&mut self, index: usize, value: SqlValue) -> std::result::Result<(), ValueError> {
            match index {
                0 => self.id = i64::from_sql_value(value)?,
                1 => self.email = String::from_sql_value(value)?,
                2 => self.token = String::from_sql_value(value)?,
                _ => return Err(ValueError::UnknownField { index }),
            }
            Ok(())
        }
    }

    impl Model for Ticket {
        const DEF: &'static ModelDef = &ModelDef::new(
            "Ticket",
            &[
                FieldDef::new("id", "id", SqlKind::Int).autoincrement(),
                FieldDef::new("email", "email", SqlKind::Text).nullable(),
                FieldDef::new("token", "token", SqlKind::Text),
            ],
        );
    }

    #[test]
    fn test_descriptor_strings() {
        let registry = Registry::new();
        let info = registry.describe::<Ticket>().unwrap();

        assert_eq!(info.table_name, "ticket");
        assert_eq!(info.fields_simple, "id, email, token");
        assert_eq!(info.fields_prefixed, "ticket.id, ticket.email, ticket.token");
        assert_eq!(info.fields_insert, "email, token");
        assert_eq!(info.placeholders, "?, ?");
        assert_eq!(info.insert_count(), 2);
        assert_eq!(info.nullable_count(), 1);
    }

    #[test]
    fn test_describe_is_cached() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        let first = registry.describe::<Ticket>().unwrap();
        let second = registry.describe_record(&Ticket::default()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_first_describe() {
        let registry = Registry::new();
        let infos: Vec<Arc<ModelInfo>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.describe::<Ticket>().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for info in &infos {
            assert!(Arc::ptr_eq(info, &infos[0]));
            assert_eq!(info.fields.len(), 3);
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_scalar_arg_has_no_descriptor() {
        let registry = Registry::new();
        assert!(registry.describe_arg(&Arg::from(5_i64)).unwrap().is_none());
        let ticket = Ticket::default();
        assert!(registry.describe_arg(&Arg::record(&ticket)).unwrap().is_some());
    }

    #[derive(Debug, Default)]
    struct Broken;

    impl Record for Broken {
        fn model_def(&self) -> &'static ModelDef {
            Self::DEF
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn field_values(&self) -> Vec<SqlValue> {
            Vec::new()
        }

        fn set_field(&mut self, index: usize, _value: SqlValue) -> std::result::Result<(), ValueError> {
            Err(ValueError::UnknownField { index })
        }
    }

    impl Model for Broken {
        const DEF: &'static ModelDef = &ModelDef::new(
            "Broken",
            &[FieldDef::new("id", "id", SqlKind::Int).autoincrement().nullable()],
        );
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let err = Registry::new().describe::<Broken>().unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidField {
                model: "Broken",
                field: "id",
                ..
            }
        ));
    }

    #[derive(Debug, Default)]
    struct Generated {
        id: Option<i64>,
    }

    impl Record for Generated {
        fn model_def(&self) -> &'static ModelDef {
            Self::DEF
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn field_values(&self) -> Vec<SqlValue> {
            vec![self.id.to_sql_value()]
        }

        fn set_field(&mut self, index: usize, value: SqlValue) -> std::result::Result<(), ValueError> {
            match index {
                0 => self.id = Option::from_sql_value(value)?,
                _ => return Err(ValueError::UnknownField { index }),
            }
            Ok(())
        }
    }

    impl Model for Generated {
        const DEF: &'static ModelDef = &ModelDef::new(
            "Generated",
            &[FieldDef::new("id", "id", SqlKind::Int).autoincrement().optional()],
        );
    }

    #[test]
    fn test_optional_autoincrement_is_valid() {
        let info = Registry::new().describe::<Generated>().unwrap();
        assert!(info.fields[0].accepts_null());
        assert!(!info.fields[0].nullable);
        assert_eq!(info.fields_insert, "");
        assert_eq!(info.nullable_count(), 1);
    }

    mod other {
        use super::*;

        /// Same type name as the outer `Ticket`, different type.
        #[derive(Debug, Default)]
        pub struct Ticket;

        impl Record for Ticket {
            fn model_def(&self) -> &'static ModelDef {
                Self::DEF
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn field_values(&self) -> Vec<SqlValue> {
                vec![SqlValue::Null]
            }

            fn set_field(&mut self, index: usize, _value: SqlValue) -> std::result::Result<(), ValueError> {
                Err(ValueError::UnknownField { index })
            }
        }

        impl Model for Ticket {
            const DEF: &'static ModelDef = &ModelDef::new(
                "Ticket",
                &[FieldDef::new("code", "code", SqlKind::Text)],
            );
        }
    }

    #[test]
    fn test_same_name_different_type_is_mismatch() {
        let registry = Registry::new();
        registry.describe::<Ticket>().unwrap();
        let err = registry.describe::<other::Ticket>().unwrap_err();
        assert_eq!(err, MappingError::TypeMismatch { model: "Ticket" });
    }
}
