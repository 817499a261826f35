use std::collections::HashMap;

use quarry_core::driver::Connection;
use quarry_core::schema::{ColumnInfo, ColumnType};
use quarry_core::Result;

use crate::base::{row_i64, row_text};
use crate::{Base, Dialect};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn quote(&self, ident: &str) -> String {
        Base::quote_with(ident, '`')
    }

    fn sql_type(&self, ty: ColumnType, _size: usize) -> String {
        // Affinities, not sizes. Timestamps are stored as unix integers.
        match ty {
            ColumnType::Bool
            | ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::Timestamp => "integer".to_string(),
            ColumnType::Float => "float".to_string(),
            ColumnType::Binary => "blob".to_string(),
            ColumnType::Text => "text".to_string(),
        }
    }

    fn compatible_sql_types(&self, ty: ColumnType) -> &'static [&'static str] {
        match ty {
            ColumnType::Bool
            | ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::Timestamp => &["integer"],
            ColumnType::Float => &["float", "real"],
            ColumnType::Binary => &["blob"],
            ColumnType::Text => &["text"],
        }
    }

    fn columns_in_table(
        &self,
        conn: &dyn Connection,
        _db_name: &str,
        table: &str,
    ) -> Result<HashMap<String, ColumnInfo>> {
        // PRAGMA arguments cannot be bound.
        let sql = format!("PRAGMA table_info({table})");
        let rows = conn.query(&sql, &[])?;

        let mut columns = HashMap::with_capacity(rows.len());
        for row in rows {
            // cid, name, type, notnull, dflt_value, pk
            let name = row_text(&row, 1);
            columns.insert(
                name.clone(),
                ColumnInfo {
                    name,
                    table: table.to_string(),
                    sql_type: row_text(&row, 2),
                    length: -1,
                    nullable: row_i64(&row, 3) == 0,
                    ordinal: row_i64(&row, 0).max(0) as usize,
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
        let sql = "SELECT name FROM sqlite_master \
                   WHERE type = 'index' AND tbl_name = ? AND name = ?";
        let rows = conn.query(sql, &[table.into(), index.into()])?;
        Ok(!rows.is_empty())
    }

    fn primary_key_sql(&self, string_pk: bool, _size: usize) -> String {
        if string_pk {
            "text PRIMARY KEY".to_string()
        } else {
            "integer PRIMARY KEY AUTOINCREMENT".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_core::schema::{Column, SchemaBuilder, TableDef};
    use quarry_core::schema::RailsNaming;

    #[test]
    fn everything_integer_affinity() {
        assert_eq!(Sqlite.sql_type(ColumnType::Bool, 0), "integer");
        assert_eq!(Sqlite.sql_type(ColumnType::Timestamp, 0), "integer");
        assert_eq!(Sqlite.sql_type(ColumnType::Text, 255), "text");
    }

    #[test]
    fn create_table_includes_foreign_keys() {
        let schema = SchemaBuilder::new()
            .table(
                TableDef::new("User")
                    .column(Column::new("id", ColumnType::BigInt))
                    .column(Column::new("name", ColumnType::Text).not_null()),
            )
            .table(
                TableDef::new("Post")
                    .column(Column::new("id", ColumnType::BigInt))
                    .column(Column::new("title", ColumnType::Text))
                    .column(Column::new("user_id", ColumnType::BigInt))
                    .belongs_to("User"),
            )
            .build(&RailsNaming)
            .unwrap();

        let source = schema.source_by_name("Post").unwrap();
        let statements = Sqlite.create_table_sql(&schema, source, true);
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            "CREATE TABLE IF NOT EXISTS `posts` ( \
             `id` integer PRIMARY KEY AUTOINCREMENT, \
             `title` text, \
             `user_id` integer, \
             FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE )"
        );
    }
}
