mod base;
pub use base::Base;

mod dialect;
pub use dialect::{Dialect, DialectRegistry};

mod mysql;
pub use mysql::Mysql;

mod oracle;
pub use oracle::Oracle;

mod postgresql;
pub use postgresql::PostgreSql;

mod sqlite;
pub use sqlite::Sqlite;
