use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quarry_core::driver::Connection;
use quarry_core::schema::{Column, ColumnInfo, ColumnType, Schema, Source};
use quarry_core::stmt::{Scope, Value};
use quarry_core::{Error, Result};

use crate::base::Base;
use crate::{Mysql, Oracle, PostgreSql, Sqlite};

/// A SQL dialect strategy: identifier quoting, marker formatting, the
/// generic-to-native type map, statement assembly, introspection, and DDL.
///
/// Implementations are stateless. Statement assembly has default methods
/// that delegate to [`Base`]; dialects override only where they diverge.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// The name the dialect registers under, e.g. `"postgres"`.
    fn name(&self) -> &'static str;

    /// Quote an identifier; dotted paths are quoted per segment.
    fn quote(&self, ident: &str) -> String;

    /// Rewrite positional `?` markers to the native form. The default keeps
    /// them as-is.
    fn format_query(&self, sql: &str) -> String {
        sql.to_string()
    }

    /// The native column type for a generic one. Panics on a combination
    /// the backend cannot represent; that is a mapping mistake, not a
    /// runtime condition.
    fn sql_type(&self, ty: ColumnType, size: usize) -> String;

    /// Native types an existing column may already use for `ty`, most
    /// preferred first. Empty when the backend has no representation.
    fn compatible_sql_types(&self, ty: ColumnType) -> &'static [&'static str];

    /// True when INSERT reports the generated key through the driver's
    /// last-insert-id. False when the statement returns it as a result row
    /// (`RETURNING`), in which case the caller scans instead.
    fn create_exec(&self) -> bool {
        true
    }

    /// True for backends that require every non-aggregated selected column
    /// to appear in GROUP BY.
    fn expand_group_by(&self) -> bool {
        false
    }

    /// Introspect the live columns of `table`. A table that does not exist
    /// yields an empty map.
    fn columns_in_table(
        &self,
        conn: &dyn Connection,
        db_name: &str,
        table: &str,
    ) -> Result<HashMap<String, ColumnInfo>>;

    fn index_exists(
        &self,
        conn: &dyn Connection,
        db_name: &str,
        table: &str,
        index: &str,
    ) -> Result<bool>;

    // Statement assembly. IN-list expansion runs before marker formatting
    // in every one of these; the marker count is final by the time
    // `format_query` sees the string.

    fn select_sql(&self, scope: &Scope) -> (String, Vec<Value>) {
        let (sql, values) = Base::select_sql(self, scope);
        let (sql, values) = Base::expand_in_lists(&sql, values);
        (self.format_query(&sql), values)
    }

    fn insert_sql(&self, table: &str, pk: &str, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let _ = pk;
        let (sql, args) = Base::insert_sql(self, table, values);
        (self.format_query(&sql), args)
    }

    fn update_sql(&self, scope: &Scope, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let (sql, args) = Base::update_sql(self, scope, values);
        let (sql, args) = Base::expand_in_lists(&sql, args);
        (self.format_query(&sql), args)
    }

    fn delete_sql(&self, scope: &Scope) -> (String, Vec<Value>) {
        let (sql, args) = Base::delete_sql(scope);
        let (sql, args) = Base::expand_in_lists(&sql, args);
        (self.format_query(&sql), args)
    }

    /// The trailing row-bound clause of a SELECT. Zero means unset.
    fn limit_sql(&self, scope: &Scope) -> String {
        let mut out = String::new();
        if scope.limit > 0 {
            out.push_str(&format!(" LIMIT {}", scope.limit));
        }
        if scope.offset > 0 {
            out.push_str(&format!(" OFFSET {}", scope.offset));
        }
        out
    }

    // DDL.

    /// Statements creating the table for `source`. A single statement for
    /// most backends; Oracle adds the sequence and trigger emulating
    /// auto-increment.
    fn create_table_sql(&self, schema: &Schema, source: &Source, if_not_exists: bool) -> Vec<String> {
        vec![Base::create_table_sql(self, schema, source, if_not_exists)]
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote(table))
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote(table),
            self.quote(&column.name),
            self.sql_type(column.ty, column.size)
        )
    }

    fn create_index_sql(&self, name: &str, table: &str, unique: bool, columns: &[&str]) -> String {
        let unique = if unique { "UNIQUE " } else { "" };
        let columns = columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE {unique}INDEX {} ON {} ({columns})",
            self.quote(name),
            self.quote(table)
        )
    }

    /// Column definition of the primary key, auto-incrementing when the
    /// key is numeric.
    fn primary_key_sql(&self, string_pk: bool, size: usize) -> String;
}

/// Caller-owned dialect lookup. There is no global registry; construct one,
/// extend or override it, and hand it to the database builder.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// An empty registry with no dialects at all.
    pub fn empty() -> Self {
        Self {
            dialects: HashMap::new(),
        }
    }

    /// Register `dialect` under `name`, replacing any previous entry of
    /// the same name.
    pub fn register(&mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) {
        self.dialects.insert(name.into(), dialect);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownDialect(name.to_string()))
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("mysql", Arc::new(Mysql));
        registry.register("postgres", Arc::new(PostgreSql));
        registry.register("sqlite3", Arc::new(Sqlite));
        registry.register("oracle", Arc::new(Oracle));
        registry
    }
}
