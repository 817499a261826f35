mod value;
use value::Value;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use quarry_core::driver::{Connection, ExecResult, Row};
use quarry_core::stmt::Value as CoreValue;
use quarry_core::{Error, Result};
use rusqlite::Connection as RusqliteConnection;
use url::Url;

/// Where the SQLite database lives.
#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Parse a `sqlite:` connection URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| Error::Driver(err.into()))?;

        if url.scheme() != "sqlite" {
            return Err(Error::Driver(anyhow::anyhow!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn connect(&self) -> Result<SqliteConnection> {
        let connection = match self {
            Self::File(path) => RusqliteConnection::open(path).map_err(driver_err)?,
            Self::InMemory => RusqliteConnection::open_in_memory().map_err(driver_err)?,
        };
        Ok(SqliteConnection {
            connection: Mutex::new(connection),
        })
    }
}

/// A single SQLite connection. rusqlite connections are not `Sync`, so the
/// handle lives behind a mutex; statements serialize through it.
#[derive(Debug)]
pub struct SqliteConnection {
    connection: Mutex<RusqliteConnection>,
}

impl Connection for SqliteConnection {
    fn query(&self, sql: &str, params: &[CoreValue]) -> Result<Vec<Row>> {
        let connection = self.connection.lock().unwrap();
        let mut stmt = connection.prepare(sql).map_err(driver_err)?;

        let columns: Arc<[String]> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>()
            .into();
        let width = columns.len();

        let params: Vec<Value> = params.iter().map(|v| Value::from(v.clone())).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(driver_err)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(driver_err)? {
            let mut values = Vec::with_capacity(width);
            for index in 0..width {
                values.push(Value::from_sql(row, index).map_err(driver_err)?.into_inner());
            }
            out.push(Row::new(columns.clone(), values));
        }
        Ok(out)
    }

    fn execute(&self, sql: &str, params: &[CoreValue]) -> Result<ExecResult> {
        let connection = self.connection.lock().unwrap();
        let mut stmt = connection.prepare(sql).map_err(driver_err)?;

        let params: Vec<Value> = params.iter().map(|v| Value::from(v.clone())).collect();
        let rows_affected = stmt
            .execute(rusqlite::params_from_iter(params.iter()))
            .map_err(driver_err)? as u64;

        let last_insert_id = connection.last_insert_rowid();
        Ok(ExecResult {
            rows_affected,
            last_insert_id: (last_insert_id != 0).then_some(last_insert_id),
        })
    }

    fn begin(&self) -> Result<()> {
        self.batch("BEGIN")
    }

    fn commit(&self) -> Result<()> {
        self.batch("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.batch("ROLLBACK")
    }
}

impl SqliteConnection {
    fn batch(&self, sql: &str) -> Result<()> {
        self.connection
            .lock()
            .unwrap()
            .execute_batch(sql)
            .map_err(driver_err)
    }
}

fn driver_err(err: rusqlite::Error) -> Error {
    Error::Driver(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> SqliteConnection {
        let conn = Sqlite::in_memory().connect().unwrap();
        conn.execute("CREATE TABLE t ( id integer PRIMARY KEY AUTOINCREMENT, name text )", &[])
            .unwrap();
        conn
    }

    #[test]
    fn url_parsing() {
        assert!(matches!(Sqlite::new("sqlite::memory:").unwrap(), Sqlite::InMemory));
        assert!(matches!(Sqlite::new("sqlite:/tmp/x.db").unwrap(), Sqlite::File(_)));
        assert!(Sqlite::new("mysql://x").is_err());
    }

    #[test]
    fn round_trip() {
        let conn = connection();
        let result = conn
            .execute("INSERT INTO t (name) VALUES (?)", &["ada".into()])
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));

        let rows = conn.query("SELECT id, name FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<i64>("id").unwrap(), 1);
        assert_eq!(rows[0].get::<String>("name").unwrap(), "ada");
    }

    #[test]
    fn rollback_discards_writes() {
        let conn = connection();
        conn.begin().unwrap();
        conn.execute("INSERT INTO t (name) VALUES (?)", &["ghost".into()])
            .unwrap();
        conn.rollback().unwrap();
        assert!(conn.query("SELECT id FROM t", &[]).unwrap().is_empty());
    }
}
