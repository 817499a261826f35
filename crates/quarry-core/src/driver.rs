use std::sync::Arc;

use crate::{
    stmt::{FromValue, Value},
    Error, Result,
};

/// A blocking database connection.
///
/// Each rendered statement is fully self-contained (SQL plus its own
/// argument list), so a connection may be shared by concurrent callers
/// without query-level locking. Cancellation and timeouts are whatever the
/// underlying client provides; quarry adds none of its own.
pub trait Connection: std::fmt::Debug + Send + Sync {
    /// Execute a statement that returns rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a statement that returns no rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
}

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key, when the driver exposes one. Dialects whose INSERT
    /// returns the key as a row (`create_exec() == false`) leave this unset.
    pub last_insert_id: Option<i64>,
}

/// One result row: shared column names plus owned values in column order.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at a positional index, for single-column projections.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Convert the value under `column` to `V`. Fails with
    /// [`Error::MissingColumn`] when the column is absent and
    /// [`Error::TypeMismatch`] when the conversion is impossible.
    pub fn get<V: FromValue>(&self, column: &str) -> Result<V> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
        V::from_value(self.values[index].clone())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns: Arc<[String]> = vec!["id".to_string(), "title".to_string()].into();
        Row::new(columns, vec![Value::I64(1), Value::from("First Post")])
    }

    #[test]
    fn get_by_name() {
        let row = row();
        assert_eq!(row.get::<i64>("id").unwrap(), 1);
        assert_eq!(row.get::<String>("title").unwrap(), "First Post");
    }

    #[test]
    fn missing_column_is_typed() {
        let err = row().get::<i64>("views").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(_)));
    }
}
