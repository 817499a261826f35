mod value;
use value::Value;

use std::sync::{Arc, Mutex};

use postgres::types::ToSql;
use postgres::{Client, NoTls};
use quarry_core::driver::{Connection, ExecResult, Row};
use quarry_core::stmt::Value as CoreValue;
use quarry_core::{Error, Result};
use url::Url;

/// Connection settings for a PostgreSQL database.
#[derive(Debug)]
pub struct PostgreSql {
    url: String,
}

impl PostgreSql {
    /// Take a `postgresql:` (or `postgres:`) connection URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(|err| Error::Driver(err.into()))?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(Error::Driver(anyhow::anyhow!(
                "connection URL does not have a `postgresql` scheme; url={url_str}"
            )));
        }
        Ok(Self { url: url_str })
    }

    pub fn connect(&self) -> Result<PostgresConnection> {
        let client = Client::connect(&self.url, NoTls).map_err(driver_err)?;
        Ok(PostgresConnection {
            client: Mutex::new(client),
        })
    }
}

/// A single synchronous connection. The blocking client needs `&mut` for
/// every call, so it sits behind a mutex.
pub struct PostgresConnection {
    client: Mutex<Client>,
}

// `postgres::Client` carries no `Debug` impl of its own.
impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection").finish_non_exhaustive()
    }
}

impl Connection for PostgresConnection {
    fn query(&self, sql: &str, params: &[CoreValue]) -> Result<Vec<Row>> {
        let mut client = self.client.lock().unwrap();
        let params: Vec<Value> = params.iter().map(|v| Value::from(v.clone())).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = client.query(sql, &refs).map_err(driver_err)?;

        let mut out = Vec::with_capacity(rows.len());
        let mut columns: Option<Arc<[String]>> = None;
        for row in &rows {
            let names = columns.get_or_insert_with(|| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect::<Vec<_>>()
                    .into()
            });
            let mut values = Vec::with_capacity(names.len());
            for index in 0..names.len() {
                values.push(value::from_sql(row, index)?);
            }
            out.push(Row::new(names.clone(), values));
        }
        Ok(out)
    }

    fn execute(&self, sql: &str, params: &[CoreValue]) -> Result<ExecResult> {
        let mut client = self.client.lock().unwrap();
        let params: Vec<Value> = params.iter().map(|v| Value::from(v.clone())).collect();
        let refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows_affected = client.execute(sql, &refs).map_err(driver_err)?;
        Ok(ExecResult {
            rows_affected,
            // Generated keys arrive via RETURNING, never here.
            last_insert_id: None,
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

impl PostgresConnection {
    fn batch(&self, sql: &str) -> Result<()> {
        self.client
            .lock()
            .unwrap()
            .batch_execute(sql)
            .map_err(driver_err)
    }
}

fn driver_err(err: postgres::Error) -> Error {
    Error::Driver(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_satisfies_the_driver_bounds() {
        fn assert_bounds<T: Connection>() {}
        assert_bounds::<PostgresConnection>();
    }

    #[test]
    fn url_scheme_is_checked() {
        assert!(PostgreSql::new("postgresql://localhost/app").is_ok());
        assert!(PostgreSql::new("postgres://localhost/app").is_ok());
        assert!(PostgreSql::new("sqlite::memory:").is_err());
    }
}
