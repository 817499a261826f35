use std::collections::HashMap;

use quarry_core::driver::Connection;
use quarry_core::schema::{ColumnInfo, ColumnType, Schema, Source};
use quarry_core::stmt::{Scope, Value};
use quarry_core::Result;

use crate::base::{row_i64, row_text};
use crate::{Base, Dialect};

// Largest VARCHAR2 before the column falls back to CLOB.
const MAX_VARCHAR2: usize = 4000;

#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

impl Dialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote(&self, ident: &str) -> String {
        Base::quote_with(ident, '"')
    }

    fn format_query(&self, sql: &str) -> String {
        Base::numbered_markers(sql)
    }

    fn sql_type(&self, ty: ColumnType, size: usize) -> String {
        match ty {
            ColumnType::Bool => panic!("oracle has no boolean column type"),
            ColumnType::Integer | ColumnType::BigInt if size > 0 => format!("NUMBER({size})"),
            ColumnType::Integer | ColumnType::BigInt => "NUMBER".to_string(),
            ColumnType::Float if size > 0 => format!("NUMBER({},{})", size / 10, size % 10),
            ColumnType::Float => "NUMBER(16,2)".to_string(),
            ColumnType::Text | ColumnType::Binary if size > 0 && size < MAX_VARCHAR2 => {
                format!("VARCHAR2({size})")
            }
            ColumnType::Text | ColumnType::Binary => "CLOB".to_string(),
            ColumnType::Timestamp => "DATE".to_string(),
        }
    }

    fn compatible_sql_types(&self, ty: ColumnType) -> &'static [&'static str] {
        match ty {
            ColumnType::Bool => &[],
            ColumnType::Integer | ColumnType::BigInt | ColumnType::Float => &["NUMBER"],
            ColumnType::Text | ColumnType::Binary => &["VARCHAR2", "CLOB"],
            ColumnType::Timestamp => &["DATE", "TIMESTAMP"],
        }
    }

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

    fn limit_sql(&self, scope: &Scope) -> String {
        if scope.limit == 0 && scope.offset == 0 {
            return String::new();
        }
        let mut out = format!(" OFFSET {} ROWS", scope.offset);
        if scope.limit > 0 {
            out.push_str(&format!(" FETCH NEXT {} ROWS ONLY", scope.limit));
        }
        out
    }

    /// Numeric keys need a sequence and a before-insert trigger; there is
    /// no auto-increment column. String keys get the plain table.
    fn create_table_sql(&self, schema: &Schema, source: &Source, _if_not_exists: bool) -> Vec<String> {
        let table = Base::create_table_sql(self, schema, source, false);

        let string_pk = source
            .column(&source.primary_key)
            .map(|c| c.ty == ColumnType::Text)
            .unwrap_or(false);
        if string_pk {
            return vec![table];
        }

        let prefix = format!("{}_{}", source.table, source.primary_key);
        let sequence = format!(
            "CREATE SEQUENCE {prefix}_seq MINVALUE 1 NOMAXVALUE START WITH 1 \
             INCREMENT BY 1 NOCACHE CYCLE"
        );
        let trigger = format!(
            "CREATE TRIGGER {prefix}_trigger BEFORE INSERT ON {} FOR EACH ROW \
             WHEN (new.{pk} IS NULL) BEGIN \
             SELECT {prefix}_seq.NEXTVAL INTO :new.{pk} FROM dual; END;",
            source.table,
            pk = source.primary_key,
        );
        vec![table, sequence, trigger]
    }

    fn drop_table_sql(&self, table: &str) -> String {
        // No IF EXISTS; ORA-00942 is for the caller to tolerate.
        format!("DROP TABLE {}", self.quote(table))
    }

    fn columns_in_table(
        &self,
        conn: &dyn Connection,
        _db_name: &str,
        table: &str,
    ) -> Result<HashMap<String, ColumnInfo>> {
        let sql = self.format_query(
            "SELECT COLUMN_NAME, DATA_TYPE, NULLABLE, COALESCE(DATA_LENGTH, -1) \
             FROM USER_TAB_COLUMNS WHERE TABLE_NAME = ?",
        );
        let rows = conn.query(&sql, &[table.into()])?;

        let mut columns = HashMap::with_capacity(rows.len());
        for (ordinal, row) in rows.into_iter().enumerate() {
            let name = row_text(&row, 0);
            columns.insert(
                name.clone(),
                ColumnInfo {
                    name,
                    table: table.to_string(),
                    sql_type: row_text(&row, 1),
                    length: row_i64(&row, 3),
                    nullable: row_text(&row, 2) == "Y",
                    ordinal,
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
            "SELECT INDEX_NAME FROM USER_INDEXES \
             WHERE TABLE_NAME = ? AND INDEX_NAME = ?",
        );
        let rows = conn.query(&sql, &[table.into(), index.into()])?;
        Ok(!rows.is_empty())
    }

    fn primary_key_sql(&self, string_pk: bool, size: usize) -> String {
        if string_pk {
            let size = if size == 0 { 255 } else { size };
            format!("VARCHAR2({size}) PRIMARY KEY NOT NULL")
        } else {
            let size = if size == 0 { 16 } else { size };
            format!("NUMBER({size}) PRIMARY KEY NOT NULL")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_core::schema::{Column, RailsNaming, SchemaBuilder, TableDef};

    fn schema_with_posts() -> Schema {
        SchemaBuilder::new()
            .table(
                TableDef::new("Post")
                    .column(Column::new("id", ColumnType::BigInt))
                    .column(Column::new("title", ColumnType::Text).size(128)),
            )
            .build(&RailsNaming)
            .unwrap()
    }

    #[test]
    fn double_quote_quoting() {
        assert_eq!(Oracle.quote("posts.title"), "\"posts\".\"title\"");
    }

    #[test]
    fn numeric_key_creates_sequence_and_trigger() {
        let schema = schema_with_posts();
        let source = schema.source_by_name("Post").unwrap();
        let statements = Oracle.create_table_sql(&schema, source, true);
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE \"posts\""));
        assert!(statements[1].starts_with("CREATE SEQUENCE posts_id_seq"));
        assert!(statements[2].starts_with("CREATE TRIGGER posts_id_trigger"));
    }

    #[test]
    fn string_key_skips_the_sequence() {
        let schema = SchemaBuilder::new()
            .table(
                TableDef::new("Token")
                    .column(Column::new("id", ColumnType::Text).size(40)),
            )
            .build(&RailsNaming)
            .unwrap();
        let source = schema.source_by_name("Token").unwrap();
        assert_eq!(Oracle.create_table_sql(&schema, source, true).len(), 1);
    }

    #[test]
    fn row_bounds_use_fetch_syntax() {
        let scope = Scope::new("posts", "id").limit(10).offset(20);
        assert_eq!(
            Oracle.limit_sql(&scope),
            " OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(Oracle.limit_sql(&Scope::new("posts", "id")), "");
    }

    #[test]
    fn type_map() {
        assert_eq!(Oracle.sql_type(ColumnType::BigInt, 0), "NUMBER");
        assert_eq!(Oracle.sql_type(ColumnType::Float, 0), "NUMBER(16,2)");
        assert_eq!(Oracle.sql_type(ColumnType::Text, 80), "VARCHAR2(80)");
        assert_eq!(Oracle.sql_type(ColumnType::Text, 8000), "CLOB");
    }

    #[test]
    #[should_panic(expected = "no boolean column type")]
    fn booleans_are_rejected() {
        Oracle.sql_type(ColumnType::Bool, 0);
    }
}
