//! SQL values and the conversions between them and Rust field types.
//!
//! Values travel in two directions: record fields are flattened into
//! [`SqlValue`]s for binding ([`ToSqlValue`]), and decoded column values are
//! copied back into fields ([`FromSqlValue`]). [`SqlType`] tells the row
//! materializer which scalar kind a field holds.

use std::fmt;

use crate::error::ValueError;

/// A SQL value that can be bound as a parameter or decoded from a column.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns true if this is the zero value of its kind.
    ///
    /// NULL, `false`, `0`, `0.0`, the empty string and the empty blob are
    /// zero values. Nullable record fields holding a zero value are sent as
    /// NULL on insertion.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !*b,
            Self::Int(n) => *n == 0,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::Blob(b) => b.is_empty(),
        }
    }

    /// Returns true if this is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the name of the value's kind, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOL",
            Self::Int(_) => "INT",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
            Self::Blob(_) => "BLOB",
        }
    }
}

/// The scalar kind of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlKind {
    /// Boolean.
    Bool,
    /// 64-bit signed integer (narrower integers are widened).
    Int,
    /// Double precision float.
    Float,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Blob,
    /// A custom leaf type that decodes itself from whatever the column holds.
    ///
    /// Opaque kinds are scanned as-is and have no nullable wrapper.
    Opaque,
}

impl fmt::Display for SqlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "BOOL",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
            Self::Opaque => "OPAQUE",
        };
        f.write_str(name)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(&self) -> SqlValue;

    /// Returns true if this is the zero value of the type.
    ///
    /// Defaults to [`SqlValue::is_zero`] on the converted value. `Option<T>`
    /// overrides it: only `None` is zero, so `Some(0)` stays a value.
    fn is_zero_value(&self) -> bool {
        self.to_sql_value().is_zero()
    }
}

/// Trait for types that can be populated from a decoded SQL value.
///
/// Plain scalars decode NULL to their zero value; this is what a field
/// marked nullable receives when the column is NULL. `Option<T>` decodes
/// NULL to `None`.
pub trait FromSqlValue: Sized {
    /// Converts a decoded value into `Self`.
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError>;
}

/// Compile-time scalar kind of a field type.
pub trait SqlType {
    /// The scalar kind used to pick a scan target.
    const KIND: SqlKind = SqlKind::Opaque;

    /// Whether the type itself can hold NULL (`Option<T>`).
    const NULLABLE: bool = false;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(&self) -> SqlValue {
        self.clone()
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl SqlType for SqlValue {}

impl<T: ToSqlValue + ?Sized> ToSqlValue for &T {
    fn to_sql_value(&self) -> SqlValue {
        (**self).to_sql_value()
    }

    fn is_zero_value(&self) -> bool {
        (**self).is_zero_value()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(false),
            SqlValue::Bool(b) => Ok(b),
            // SQLite has no boolean storage class
            SqlValue::Int(n) => Ok(n != 0),
            other => Err(ValueError::mismatch(SqlKind::Bool, &other)),
        }
    }
}

impl SqlType for bool {
    const KIND: SqlKind = SqlKind::Bool;
}

impl ToSqlValue for i64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int(*self)
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(0),
            SqlValue::Int(n) => Ok(n),
            SqlValue::Bool(b) => Ok(Self::from(b)),
            other => Err(ValueError::mismatch(SqlKind::Int, &other)),
        }
    }
}

impl SqlType for i64 {
    const KIND: SqlKind = SqlKind::Int;
}

macro_rules! impl_narrow_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }
            }

            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
                    let wide = i64::from_sql_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                        target: stringify!($ty),
                        value: wide,
                    })
                }
            }

            impl SqlType for $ty {
                const KIND: SqlKind = SqlKind::Int;
            }
        )+
    };
}

impl_narrow_int!(i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl FromSqlValue for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(0.0),
            SqlValue::Float(f) => Ok(f),
            SqlValue::Int(n) => Ok(n as Self),
            other => Err(ValueError::mismatch(SqlKind::Float, &other)),
        }
    }
}

impl SqlType for f64 {
    const KIND: SqlKind = SqlKind::Float;
}

impl ToSqlValue for f32 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }
}

impl FromSqlValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl SqlType for f32 {
    const KIND: SqlKind = SqlKind::Float;
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for str {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(Self::new()),
            SqlValue::Text(s) => Ok(s),
            SqlValue::Blob(b) => {
                Self::from_utf8(b).map_err(|_| ValueError::Mismatch {
                    expected: SqlKind::Text,
                    found: "BLOB (invalid UTF-8)",
                })
            }
            other => Err(ValueError::mismatch(SqlKind::Text, &other)),
        }
    }
}

impl SqlType for String {
    const KIND: SqlKind = SqlKind::Text;
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Blob(self.clone())
    }
}

impl ToSqlValue for [u8] {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(Self::new()),
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(ValueError::mismatch(SqlKind::Blob, &other)),
        }
    }
}

impl SqlType for Vec<u8> {
    const KIND: SqlKind = SqlKind::Blob;
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }

    fn is_zero_value(&self) -> bool {
        self.is_none()
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self, ValueError> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

impl<T: SqlType> SqlType for Option<T> {
    const KIND: SqlKind = T::KIND;
    const NULLABLE: bool = true;
}
