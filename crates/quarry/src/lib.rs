mod db;
pub use db::{Database, DatabaseBuilder};

mod model;
pub use model::Model;

mod scope;
pub use scope::Scope;

mod transaction;
pub use transaction::Transaction;

pub use quarry_core::driver::{Connection, ExecResult, Row};
pub use quarry_core::schema::{
    Column, ColumnType, NamingConvention, RailsNaming, SimpleNaming, TableDef,
};
pub use quarry_core::stmt::{Comparator, Direction, FromValue, Selector, Value};
pub use quarry_core::{Error, Result};
pub use quarry_sql::{Dialect, DialectRegistry};
