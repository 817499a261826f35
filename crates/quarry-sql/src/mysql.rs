use std::collections::HashMap;

use quarry_core::driver::Connection;
use quarry_core::schema::{ColumnInfo, ColumnType};
use quarry_core::Result;

use crate::base::{row_i64, row_text};
use crate::{Base, Dialect};

// Widest size a MySQL row-format varchar/varbinary column can take.
const MAX_INLINE: usize = 65532;

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Dialect for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        Base::quote_with(ident, '`')
    }

    fn sql_type(&self, ty: ColumnType, size: usize) -> String {
        match ty {
            ColumnType::Bool => "boolean".to_string(),
            ColumnType::Integer => "int".to_string(),
            ColumnType::BigInt => "bigint".to_string(),
            ColumnType::Float => "double".to_string(),
            ColumnType::Binary if size > 0 && size < MAX_INLINE => format!("varbinary({size})"),
            ColumnType::Binary => "longblob".to_string(),
            ColumnType::Text if size > 0 && size < MAX_INLINE => format!("varchar({size})"),
            ColumnType::Text => "longtext".to_string(),
            ColumnType::Timestamp => "timestamp".to_string(),
        }
    }

    fn compatible_sql_types(&self, ty: ColumnType) -> &'static [&'static str] {
        match ty {
            ColumnType::Bool => &["boolean", "tinyint"],
            ColumnType::Integer => &["int", "integer"],
            ColumnType::BigInt => &["bigint"],
            ColumnType::Float => &["double", "float"],
            ColumnType::Binary => &["varbinary", "longblob", "blob"],
            ColumnType::Text => &["varchar", "longtext", "text"],
            ColumnType::Timestamp => &["timestamp", "datetime"],
        }
    }

    fn columns_in_table(
        &self,
        conn: &dyn Connection,
        db_name: &str,
        table: &str,
    ) -> Result<HashMap<String, ColumnInfo>> {
        let sql = "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, \
                   COALESCE(CHARACTER_MAXIMUM_LENGTH, -1), ORDINAL_POSITION \
                   FROM INFORMATION_SCHEMA.COLUMNS \
                   WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";
        let rows = conn.query(sql, &[db_name.into(), table.into()])?;

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
        db_name: &str,
        table: &str,
        index: &str,
    ) -> Result<bool> {
        let sql = "SELECT INDEX_NAME FROM INFORMATION_SCHEMA.STATISTICS \
                   WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND INDEX_NAME = ?";
        let rows = conn.query(sql, &[db_name.into(), table.into(), index.into()])?;
        Ok(!rows.is_empty())
    }

    fn primary_key_sql(&self, string_pk: bool, size: usize) -> String {
        if string_pk {
            let size = if size == 0 { 255 } else { size };
            format!("varchar({size}) PRIMARY KEY")
        } else {
            "bigint PRIMARY KEY AUTO_INCREMENT".to_string()
        }
    }
}
