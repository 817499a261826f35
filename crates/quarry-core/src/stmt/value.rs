use crate::{Error, Result};

/// A bind value flowing between the query builder and a database driver.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Signed 64-bit integer; all integer bindings widen to this.
    I64(i64),

    /// 64-bit float
    F64(f64),

    /// String value
    String(String),

    /// Raw byte payload
    Bytes(Vec<u8>),

    /// A list of values bound as a single logical argument (`IN` lists).
    List(Vec<Value>),

    /// Null value
    #[default]
    Null,
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn bytes(src: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(src.into())
    }

    pub fn list_from_vec(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    /// True for the values the save path treats as "no primary key yet".
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::I64(v) => *v == 0,
            Self::String(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Variant name, used in conversion error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::I64(_) => "I64",
            Self::F64(_) => "F64",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Null => "Null",
        }
    }

    /// Render the value as a SQL-ish literal for log output. Never used to
    /// build executable SQL.
    pub fn sql_literal(&self) -> String {
        match self {
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::I64(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::String(v) => format!("'{}'", v.replace('\'', "''")),
            Self::Bytes(v) => {
                let mut out = String::with_capacity(v.len() * 2 + 3);
                out.push_str("X'");
                for byte in v {
                    out.push_str(&format!("{byte:02x}"));
                }
                out.push('\'');
                out
            }
            Self::List(items) => items
                .iter()
                .map(Value::sql_literal)
                .collect::<Vec<_>>()
                .join(","),
            Self::Null => "NULL".to_string(),
        }
    }

    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

macro_rules! impl_from_int {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Value {
                fn from(src: $ty) -> Self {
                    Self::I64(src as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(src: f32) -> Self {
        Self::F64(src as f64)
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&String> for Value {
    fn from(src: &String) -> Self {
        Self::String(src.clone())
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(src: &[u8]) -> Self {
        Self::Bytes(src.to_vec())
    }
}

impl<T> From<Vec<T>> for Value
where
    Value: From<T>,
{
    fn from(src: Vec<T>) -> Self {
        Self::List(src.into_iter().map(Value::from).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::from(value),
            None => Self::Null,
        }
    }
}

/// Conversion from a driver [`Value`] back into a Rust type, used by row
/// mapping and `pluck`. Mismatches are typed errors, never panics.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            // Several backends surface booleans as integer columns.
            Value::I64(v) => Ok(v != 0),
            other => Err(Error::type_mismatch(&other, "bool")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I64(v) => Ok(v),
            other => Err(Error::type_mismatch(&other, "i64")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I64(v) => {
                i32::try_from(v).map_err(|_| Error::type_mismatch(&Value::I64(v), "i32"))
            }
            other => Err(Error::type_mismatch(&other, "i32")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(v),
            Value::I64(v) => Ok(v as f64),
            other => Err(Error::type_mismatch(&other, "f64")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(Error::type_mismatch(&other, "String")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(Error::type_mismatch(&other, "Vec<u8>")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
