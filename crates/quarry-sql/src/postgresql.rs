use std::collections::HashMap;

use quarry_core::driver::Connection;
use quarry_core::schema::{ColumnInfo, ColumnType};
use quarry_core::stmt::Value;
use quarry_core::Result;

use crate::base::{row_i64, row_text};
use crate::{Base, Dialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSql;

impl Dialect for PostgreSql {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote(&self, ident: &str) -> String {
        Base::quote_with(ident, '"')
    }

    fn format_query(&self, sql: &str) -> String {
        Base::numbered_markers(sql)
    }

    fn sql_type(&self, ty: ColumnType, size: usize) -> String {
        match ty {
            ColumnType::Bool => "boolean".to_string(),
            ColumnType::Integer => "integer".to_string(),
            ColumnType::BigInt => "bigint".to_string(),
            ColumnType::Float => "double precision".to_string(),
            ColumnType::Binary => "bytea".to_string(),
            ColumnType::Text if size > 0 => format!("character varying({size})"),
            ColumnType::Text => "text".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
        }
    }

    fn compatible_sql_types(&self, ty: ColumnType) -> &'static [&'static str] {
        match ty {
            ColumnType::Bool => &["boolean", "bool"],
            ColumnType::Integer => &["int", "integer", "int4"],
            ColumnType::BigInt => &["bigint", "int8"],
            ColumnType::Float => &["double precision", "float8"],
            ColumnType::Binary => &["bytea"],
            ColumnType::Text => &["character varying", "text"],
            ColumnType::Timestamp => &["timestamp", "timestamptz", "date"],
        }
    }

    /// INSERT carries `RETURNING`; the generated key arrives as a row.
    fn create_exec(&self) -> bool {
        false
    }

    fn expand_group_by(&self) -> bool {
        true
    }

    fn insert_sql(&self, table: &str, pk: &str, values: &[(String, Value)]) -> (String, Vec<Value>) {
        let (mut sql, args) = Base::insert_sql(self, table, values);
        sql.push_str(" RETURNING ");
        sql.push_str(&self.quote(pk));
        (self.format_query(&sql), args)
    }

    fn columns_in_table(
        &self,
        conn: &dyn Connection,
        db_name: &str,
        table: &str,
    ) -> Result<HashMap<String, ColumnInfo>> {
        let sql = self.format_query(
            "SELECT column_name, data_type, is_nullable, \
             COALESCE(character_maximum_length, -1), ordinal_position \
             FROM information_schema.columns \
             WHERE table_catalog = ? AND table_name = ?",
        );
        let rows = conn.query(&sql, &[db_name.into(), table.into()])?;

        let mut columns = HashMap::with_capacity(rows.len());
        for row in rows {
            let name = row_text(&row, 0);
            columns.insert(
                name.clone(),
                ColumnInfo {
                    name,
                    table: table.to_string(),
                    sql_type: row_text(&row, 1),
                    length: row_i64(&row, 3),
                    nullable: row_text(&row, 2) == "YES",
                    ordinal: (row_i64(&row, 4).max(1) - 1) as usize,
                },
            );
        }
        Ok(columns)
    }

    fn index_exists(
        &self,
        conn: &dyn Connection,
        _db_name: &str,
        table: &str,
        index: &str,
    ) -> Result<bool> {
        let sql = self.format_query(
            "SELECT indexname FROM pg_indexes WHERE tablename = ? AND indexname = ?",
        );
        let rows = conn.query(&sql, &[table.into(), index.into()])?;
        Ok(!rows.is_empty())
    }

    fn primary_key_sql(&self, string_pk: bool, size: usize) -> String {
        if string_pk {
            let size = if size == 0 { 255 } else { size };
            format!("character varying({size}) PRIMARY KEY")
        } else {
            "bigserial PRIMARY KEY".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_core::stmt::Scope;

    #[test]
    fn double_quote_quoting() {
        assert_eq!(PostgreSql.quote("posts.title"), "\"posts\".\"title\"");
    }

    #[test]
    fn markers_become_numbered() {
        assert_eq!(
            PostgreSql.format_query("a = ? AND b = ?"),
            "a = $1 AND b = $2"
        );
    }

    #[test]
    fn insert_returns_the_key_as_a_row() {
        assert!(!PostgreSql.create_exec());
        let (sql, args) = PostgreSql.insert_sql(
            "posts",
            "id",
            &[
                ("title".to_string(), Value::from("First")),
                ("views".to_string(), Value::from(0)),
            ],
        );
        assert_eq!(
            sql,
            "INSERT INTO \"posts\" (\"title\", \"views\") VALUES ($1, $2) RETURNING \"id\""
        );
        assert_eq!(args, vec![Value::from("First"), Value::I64(0)]);
    }

    #[test]
    fn select_formats_markers_after_expansion() {
        let scope = Scope::new("posts", "id")
            .equal_to("posts.state", "published")
            .in_list("posts.id", vec![1.into(), 2.into(), 3.into()]);
        let (sql, values) = PostgreSql.select_sql(&scope);
        assert_eq!(
            sql,
            "SELECT posts.* FROM posts WHERE posts.state = $1 AND posts.id IN ($2, $3, $4)"
        );
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn type_map() {
        assert_eq!(PostgreSql.sql_type(ColumnType::Text, 40), "character varying(40)");
        assert_eq!(PostgreSql.sql_type(ColumnType::Float, 0), "double precision");
        assert_eq!(PostgreSql.sql_type(ColumnType::Binary, 0), "bytea");
    }
}
