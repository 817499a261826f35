use quarry_core::driver::Row;
use quarry_core::schema::{ColumnType, RelationKind, Schema, Source};
use quarry_core::stmt::{Scope, Value};

use crate::Dialect;

// Lenient accessors for introspection rows; backends disagree on the
// native types of catalog columns.

pub(crate) fn row_text(row: &Row, index: usize) -> String {
    match row.value(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bytes(b)) => String::from_utf8_lossy(b).into_owned(),
        Some(v) => v.sql_literal(),
        None => String::new(),
    }
}

pub(crate) fn row_i64(row: &Row, index: usize) -> i64 {
    match row.value(index) {
        Some(Value::I64(n)) => *n,
        Some(Value::F64(f)) => *f as i64,
        Some(Value::String(s)) => s.parse().unwrap_or(-1),
        _ => -1,
    }
}

/// The shared assembly strategy every dialect starts from. Dialects call
/// into these functions from their trait methods and layer their own
/// behavior around them; nothing here is mandatory.
#[derive(Debug, Clone, Copy)]
pub struct Base;

impl Base {
    /// Quote every dot-separated segment of `ident` with `mark`.
    pub fn quote_with(ident: &str, mark: char) -> String {
        let mut out = String::with_capacity(ident.len() + 4);
        for (i, segment) in ident.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push(mark);
            out.push_str(segment);
            out.push(mark);
        }
        out
    }

    /// Rewrite each `?` to a sequential `$n` marker.
    pub fn numbered_markers(sql: &str) -> String {
        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0;
        for ch in sql.chars() {
            if ch == '?' {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            } else {
                out.push(ch);
            }
        }
        out
    }

    /// Expand every `?` bound to a [`Value::List`] into one marker per
    /// element and flatten the list into the bind values. An empty list
    /// renders `NULL` (matches no row) and consumes no bind value. Must run
    /// before marker formatting.
    pub fn expand_in_lists(sql: &str, values: Vec<Value>) -> (String, Vec<Value>) {
        let mut out = String::with_capacity(sql.len());
        let mut flat = Vec::with_capacity(values.len());
        let mut bind = values.into_iter();

        for ch in sql.chars() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            match bind.next() {
                Some(Value::List(items)) => {
                    if items.is_empty() {
                        out.push_str("NULL");
                    } else {
                        let markers = vec!["?"; items.len()].join(", ");
                        out.push_str(&markers);
                        flat.extend(items);
                    }
                }
                Some(value) => {
                    out.push('?');
                    flat.push(value);
                }
                // More markers than values: leave the marker for the
                // driver to reject.
                None => out.push('?'),
            }
        }
        (out, flat)
    }

    /// `SELECT ... FROM ...` assembly, unformatted and unexpanded. Bind
    /// values follow clause order: joins, WHERE, HAVING.
    pub fn select_sql<D: Dialect + ?Sized>(dialect: &D, scope: &Scope) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {}", scope.selector_sql(), scope.table);
        let (join_sql, mut values) = scope.join_sql();
        sql.push_str(&join_sql);

        let (cond_sql, cond_values) = scope.condition_sql();
        if !cond_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&cond_sql);
            values.extend(cond_values);
        }
        if let Some(group) = &scope.group {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
        let (having_sql, having_values) = scope.having_sql();
        if !having_sql.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&having_sql);
            values.extend(having_values);
        }
        sql.push_str(&scope.order_sql());
        sql.push_str(&dialect.limit_sql(scope));
        (sql, values)
    }

    pub fn insert_sql<D: Dialect + ?Sized>(
        dialect: &D,
        table: &str,
        values: &[(String, Value)],
    ) -> (String, Vec<Value>) {
        let columns = values
            .iter()
            .map(|(column, _)| dialect.quote(column))
            .collect::<Vec<_>>()
            .join(", ");
        let markers = vec!["?"; values.len()].join(", ");
        let args = values.iter().map(|(_, value)| value.clone()).collect();
        (
            format!(
                "INSERT INTO {} ({columns}) VALUES ({markers})",
                dialect.quote(table)
            ),
            args,
        )
    }

    /// `UPDATE ... SET ...` with the scope's conditions. No conditions
    /// means an unconditional update; that is the caller's call to make.
    pub fn update_sql<D: Dialect + ?Sized>(
        dialect: &D,
        scope: &Scope,
        values: &[(String, Value)],
    ) -> (String, Vec<Value>) {
        let pairs = values
            .iter()
            .map(|(column, _)| format!("{} = ?", dialect.quote(column)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut args: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();

        let mut sql = format!("UPDATE {} SET {pairs}", scope.table);
        let (cond_sql, cond_values) = scope.condition_sql();
        if !cond_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&cond_sql);
            args.extend(cond_values);
        }
        (sql, args)
    }

    pub fn delete_sql(scope: &Scope) -> (String, Vec<Value>) {
        let mut sql = format!("DELETE FROM {}", scope.table);
        let (cond_sql, values) = scope.condition_sql();
        if !cond_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&cond_sql);
        }
        (sql, values)
    }

    /// One `CREATE TABLE` statement: primary key first, then the remaining
    /// columns, then a cascading foreign key per belongs-to relation.
    pub fn create_table_sql<D: Dialect + ?Sized>(
        dialect: &D,
        schema: &Schema,
        source: &Source,
        if_not_exists: bool,
    ) -> String {
        let pk = source.column(&source.primary_key);
        let string_pk = matches!(pk.map(|c| c.ty), Some(ColumnType::Text));
        let pk_size = pk.map(|c| c.size).unwrap_or(0);

        let mut defs = vec![format!(
            "{} {}",
            dialect.quote(&source.primary_key),
            dialect.primary_key_sql(string_pk, pk_size)
        )];
        for column in &source.columns {
            if column.name == source.primary_key {
                continue;
            }
            let mut def = format!(
                "{} {}",
                dialect.quote(&column.name),
                dialect.sql_type(column.ty, column.size)
            );
            if !column.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                def.push_str(" DEFAULT ");
                def.push_str(&default.sql_literal());
            }
            defs.push(def);
        }
        for relation in &source.relations {
            if relation.kind != RelationKind::BelongsTo {
                continue;
            }
            let target = &schema[relation.target];
            defs.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
                dialect.quote(&relation.foreign_key),
                dialect.quote(&target.table),
                dialect.quote(&target.primary_key)
            ));
        }

        let exists = if if_not_exists { "IF NOT EXISTS " } else { "" };
        format!(
            "CREATE TABLE {exists}{} ( {} )",
            dialect.quote(&source.table),
            defs.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quoting_preserves_dots() {
        assert_eq!(Base::quote_with("posts", '`'), "`posts`");
        assert_eq!(Base::quote_with("posts.title", '"'), "\"posts\".\"title\"");
    }

    #[test]
    fn markers_number_sequentially() {
        assert_eq!(
            Base::numbered_markers("a = ? AND b = ?"),
            "a = $1 AND b = $2"
        );
        assert_eq!(Base::numbered_markers("no markers"), "no markers");
    }

    #[test]
    fn in_lists_expand_to_element_count() {
        let values = vec![Value::from("x"), Value::from(vec![1, 2, 3]), Value::from(9)];
        let (sql, flat) =
            Base::expand_in_lists("a = ? AND b IN (?) AND c = ?", values);
        assert_eq!(sql, "a = ? AND b IN (?, ?, ?) AND c = ?");
        assert_eq!(
            flat,
            vec![
                Value::from("x"),
                Value::I64(1),
                Value::I64(2),
                Value::I64(3),
                Value::I64(9)
            ]
        );
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let (sql, flat) =
            Base::expand_in_lists("b IN (?)", vec![Value::List(Vec::new())]);
        assert_eq!(sql, "b IN (NULL)");
        assert!(flat.is_empty());
    }
}
