use std::collections::HashMap;
use std::marker::PhantomData;

use quarry_core::driver::Row;
use quarry_core::schema::{resolve_joins, JoinTarget, SourceId};
use quarry_core::stmt::{self, Comparator, Direction, FromValue, Join, JoinKind, Selector, Value};
use quarry_core::{Error, Result};
use quarry_sql::Base;

use crate::{Database, Model};

/// A chainable query over `M`'s table.
///
/// Every builder returns a new scope and leaves the receiver untouched, so
/// a scope can be held as a base and branched from freely. Terminal
/// operations render SQL through the database's dialect and execute it on
/// the spot.
pub struct Scope<'db, M: Model> {
    db: &'db Database,
    source: SourceId,
    stmt: stmt::Scope,
    _model: PhantomData<M>,
}

impl<M: Model> Clone for Scope<'_, M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            source: self.source,
            stmt: self.stmt.identity(),
            _model: PhantomData,
        }
    }
}

impl<'db, M: Model> Scope<'db, M> {
    pub(crate) fn new(db: &'db Database, source: SourceId) -> Self {
        let src = db.source(source);
        Self {
            db,
            source,
            stmt: stmt::Scope::new(&src.table, &src.primary_key),
            _model: PhantomData,
        }
    }

    fn with(&self, stmt: stmt::Scope) -> Self {
        Self {
            db: self.db,
            source: self.source,
            stmt,
            _model: PhantomData,
        }
    }

    /// The underlying query descriptor.
    pub fn stmt(&self) -> &stmt::Scope {
        &self.stmt
    }

    // Builders.

    /// A raw condition fragment with positional `?` markers.
    pub fn filter(&self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.with(self.stmt.filter(fragment, args))
    }

    /// A raw condition fragment with `:name:` markers bound from `binds`.
    pub fn filter_named(&self, fragment: &str, binds: &HashMap<String, Value>) -> Self {
        self.with(self.stmt.filter_named(fragment, binds))
    }

    pub fn equal_to(&self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(self.stmt.equal_to(column, value))
    }

    pub fn between(
        &self,
        column: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.with(self.stmt.between(column, lower, upper))
    }

    pub fn in_list(&self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.with(self.stmt.in_list(column, values))
    }

    pub fn cmp(
        &self,
        column: impl Into<String>,
        op: Comparator,
        value: impl Into<Value>,
    ) -> Self {
        self.with(self.stmt.cmp(column, op, value))
    }

    pub fn having(&self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.with(self.stmt.having(fragment, args))
    }

    pub fn group_by(&self, expr: impl Into<String>) -> Self {
        self.with(self.stmt.group_by(expr))
    }

    pub fn limit(&self, limit: u64) -> Self {
        self.with(self.stmt.limit(limit))
    }

    pub fn offset(&self, offset: u64) -> Self {
        self.with(self.stmt.offset(offset))
    }

    pub fn order(&self, expr: &str) -> Self {
        self.with(self.stmt.order(expr))
    }

    pub fn order_by(&self, column: &str, direction: Direction) -> Self {
        self.with(self.stmt.order_by(column, direction))
    }

    pub fn reorder(&self, expr: &str) -> Self {
        self.with(self.stmt.reorder(expr))
    }

    pub fn select(&self, selector: Selector) -> Self {
        self.with(self.stmt.select(selector))
    }

    // Joins. The typed forms resolve the relation path; a table already
    // joined is skipped rather than joined twice.

    pub fn left_join<T: Model>(&self) -> Result<Self> {
        self.join_resolved(JoinKind::Left, JoinTarget::Model(T::NAME.to_string()))
    }

    pub fn inner_join<T: Model>(&self) -> Result<Self> {
        self.join_resolved(JoinKind::Inner, JoinTarget::Model(T::NAME.to_string()))
    }

    pub fn full_join<T: Model>(&self) -> Result<Self> {
        self.join_resolved(JoinKind::FullOuter, JoinTarget::Model(T::NAME.to_string()))
    }

    pub fn right_join<T: Model>(&self) -> Result<Self> {
        self.join_resolved(JoinKind::RightOuter, JoinTarget::Model(T::NAME.to_string()))
    }

    /// Join through a relation declared under an alias.
    pub fn left_join_named(&self, alias: &str) -> Result<Self> {
        self.join_resolved(JoinKind::Left, JoinTarget::Alias(alias.to_string()))
    }

    pub fn inner_join_named(&self, alias: &str) -> Result<Self> {
        self.join_resolved(JoinKind::Inner, JoinTarget::Alias(alias.to_string()))
    }

    /// A hand-written JOIN clause, used verbatim.
    pub fn join_sql(&self, sql: impl Into<String>, args: Vec<Value>) -> Self {
        self.with(self.stmt.with_join(Join::raw_sql(sql, args)))
    }

    fn join_resolved(&self, kind: JoinKind, target: JoinTarget) -> Result<Self> {
        let joins = resolve_joins(self.db.schema(), self.source, &target)?;
        let mut stmt = self.stmt.identity();
        for mut join in joins {
            if stmt.joins_table(&join.table) {
                continue;
            }
            join.kind = kind;
            stmt = stmt.with_join(join);
        }
        Ok(self.with(stmt))
    }

    // Terminals.

    pub fn find(&self, id: impl Into<Value>) -> Result<M> {
        self.equal_to(self.stmt.qualified_primary_key(), id).one()
    }

    /// The first matching row. [`Error::NoRows`] when nothing matches.
    pub fn one(&self) -> Result<M> {
        let rows = self.limit(1).rows()?;
        match rows.first() {
            Some(row) => M::from_row(row),
            None => Err(Error::NoRows),
        }
    }

    /// Every matching row, in query order. An empty match is `Ok(vec![])`.
    pub fn all(&self) -> Result<Vec<M>> {
        self.rows()?.iter().map(M::from_row).collect()
    }

    pub fn count(&self) -> Result<i64> {
        let selector = Selector::formula(format!("COUNT({})", self.stmt.qualified_primary_key()));
        let rows = self.with(self.stmt.select_only(selector)).rows()?;
        let value = rows
            .first()
            .and_then(|row| row.value(0))
            .cloned()
            .ok_or(Error::NoRows)?;
        i64::from_value(value)
    }

    /// The named column (or raw expression) of every matching row.
    /// Unqualified plain column names are qualified by the scope's table.
    pub fn pluck<V: FromValue>(&self, column: &str) -> Result<Vec<V>> {
        let selector = if column.contains('.') || column.contains('(') {
            Selector::formula(column)
        } else {
            Selector::column(&self.stmt.table, column)
        };
        let rows = self.with(self.stmt.select_only(selector)).rows()?;
        rows.into_iter()
            .map(|row| {
                let mut values = row.into_values();
                let value = if values.is_empty() {
                    Value::Null
                } else {
                    values.swap_remove(0)
                };
                V::from_value(value)
            })
            .collect()
    }

    /// Delete every matching row. With no conditions this deletes the
    /// whole table; the scope does exactly what it was told.
    pub fn delete(&self) -> Result<u64> {
        let (sql, values) = self.db.dialect().delete_sql(&self.stmt);
        Ok(self.db.run_exec(&sql, &values)?.rows_affected)
    }

    pub fn update_attribute(&self, column: impl Into<String>, value: impl Into<Value>) -> Result<u64> {
        self.update_attributes(vec![(column.into(), value.into())])
    }

    /// Set columns on every matching row. Audit columns are never touched
    /// implicitly; only what is passed gets written.
    pub fn update_attributes(&self, values: Vec<(String, Value)>) -> Result<u64> {
        let (sql, args) = self.db.dialect().update_sql(&self.stmt, &values);
        Ok(self.db.run_exec(&sql, &args)?.rows_affected)
    }

    /// A raw SET clause, for expressions like `views = views + 1`.
    pub fn update_sql(&self, set: &str, args: Vec<Value>) -> Result<u64> {
        let mut sql = format!("UPDATE {} SET {set}", self.stmt.table);
        let mut values = args;
        let (cond_sql, cond_values) = self.stmt.condition_sql();
        if !cond_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&cond_sql);
            values.extend(cond_values);
        }
        let (sql, values) = Base::expand_in_lists(&sql, values);
        let sql = self.db.dialect().format_query(&sql);
        Ok(self.db.run_exec(&sql, &values)?.rows_affected)
    }

    fn rows(&self) -> Result<Vec<Row>> {
        let (sql, values) = self.db.dialect().select_sql(&self.select_stmt());
        self.db.run_query(&sql, &values)
    }

    /// Strict backends want every non-aggregated selected column in
    /// GROUP BY; widen the clause for them before rendering.
    fn select_stmt(&self) -> stmt::Scope {
        let mut stmt = self.stmt.identity();
        if self.db.dialect().expand_group_by() {
            if let Some(group) = stmt.group.clone() {
                let mut terms = vec![group];
                for selector in &stmt.selectors {
                    if let Selector::Column { table, column, .. } = selector {
                        let expr = format!("{table}.{column}");
                        if !terms.contains(&expr) {
                            terms.push(expr);
                        }
                    }
                }
                stmt.group = Some(terms.join(", "));
            }
        }
        stmt
    }
}
