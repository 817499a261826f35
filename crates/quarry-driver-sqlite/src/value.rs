use quarry_core::stmt::Value as CoreValue;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::Row;

/// Bridges a core value to and from rusqlite's own value types.
#[derive(Debug)]
pub(crate) struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    pub(crate) fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Convert one column of a result row. SQLite's storage classes map
    /// onto the core variants directly; there is no type hint to consult.
    pub(crate) fn from_sql(row: &Row<'_>, index: usize) -> rusqlite::Result<Self> {
        let value: SqlValue = row.get(index)?;
        let core = match value {
            SqlValue::Null => CoreValue::Null,
            SqlValue::Integer(v) => CoreValue::I64(v),
            SqlValue::Real(v) => CoreValue::F64(v),
            SqlValue::Text(v) => CoreValue::String(v),
            SqlValue::Blob(v) => CoreValue::Bytes(v),
        };
        Ok(Self(core))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match &self.0 {
            CoreValue::Bool(true) => Ok(ToSqlOutput::Owned(SqlValue::Integer(1))),
            CoreValue::Bool(false) => Ok(ToSqlOutput::Owned(SqlValue::Integer(0))),
            CoreValue::I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            CoreValue::F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            CoreValue::String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            CoreValue::Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            CoreValue::Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            // Lists are expanded before a statement reaches the driver.
            CoreValue::List(_) => Err(rusqlite::Error::ToSqlConversionFailure(
                "list values must be expanded before binding".into(),
            )),
        }
    }
}
