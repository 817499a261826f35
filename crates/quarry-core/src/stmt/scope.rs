use std::collections::HashMap;

use super::{Cond, Comparator, Join, Selector, Value};

/// Sort direction for [`Scope::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An immutable query descriptor.
///
/// Every mutator copies the receiver and appends to the copy; the receiver
/// is never changed. [`Scope::identity`] is the canonical duplication.
/// Conditions are implicitly AND-ed; a limit or offset of zero means
/// "unset" and is omitted from rendered SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    pub table: String,
    pub primary_key: String,
    pub conds: Vec<Cond>,
    pub selectors: Vec<Selector>,
    pub joins: Vec<Join>,
    pub group: Option<String>,
    pub having: Vec<Cond>,
    pub order: Vec<String>,
    pub offset: u64,
    pub limit: u64,
}

impl Scope {
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            conds: Vec::new(),
            selectors: Vec::new(),
            joins: Vec::new(),
            group: None,
            having: Vec::new(),
            order: Vec::new(),
            offset: 0,
            limit: 0,
        }
    }

    /// The canonical way to duplicate a scope.
    pub fn identity(&self) -> Self {
        self.clone()
    }

    /// The primary key qualified by its table, e.g. `posts.id`.
    pub fn qualified_primary_key(&self) -> String {
        format!("{}.{}", self.table, self.primary_key)
    }

    pub fn with_cond(&self, cond: Cond) -> Self {
        let mut next = self.identity();
        next.conds.push(cond);
        next
    }

    pub fn filter(&self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        self.with_cond(Cond::raw(fragment, args))
    }

    pub fn filter_named(&self, fragment: &str, binds: &HashMap<String, Value>) -> Self {
        self.with_cond(Cond::raw_named(fragment, binds))
    }

    pub fn equal_to(&self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_cond(Cond::equal(column, value))
    }

    pub fn between(
        &self,
        column: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        self.with_cond(Cond::between(column, lower, upper))
    }

    pub fn in_list(&self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.with_cond(Cond::in_list(column, values))
    }

    pub fn cmp(
        &self,
        column: impl Into<String>,
        op: Comparator,
        value: impl Into<Value>,
    ) -> Self {
        self.with_cond(Cond::cmp(column, op, value))
    }

    pub fn having(&self, fragment: impl Into<String>, args: Vec<Value>) -> Self {
        let mut next = self.identity();
        next.having.push(Cond::raw(fragment, args));
        next
    }

    pub fn group_by(&self, expr: impl Into<String>) -> Self {
        let mut next = self.identity();
        next.group = Some(expr.into());
        next
    }

    pub fn limit(&self, limit: u64) -> Self {
        let mut next = self.identity();
        next.limit = limit;
        next
    }

    pub fn offset(&self, offset: u64) -> Self {
        let mut next = self.identity();
        next.offset = offset;
        next
    }

    /// Append an ordering expression; `ASC` is assumed when the expression
    /// carries no direction suffix.
    pub fn order(&self, expr: &str) -> Self {
        let mut next = self.identity();
        next.order.push(normalize_ordering(expr));
        next
    }

    pub fn order_by(&self, column: &str, direction: Direction) -> Self {
        let mut next = self.identity();
        next.order.push(format!("{column} {}", direction.sql()));
        next
    }

    /// Drop all prior ordering and order by `expr` alone.
    pub fn reorder(&self, expr: &str) -> Self {
        let mut next = self.identity();
        next.order = vec![normalize_ordering(expr)];
        next
    }

    pub fn with_join(&self, join: Join) -> Self {
        let mut next = self.identity();
        next.joins.push(join);
        next
    }

    pub fn with_joins(&self, joins: Vec<Join>) -> Self {
        let mut next = self.identity();
        next.joins.extend(joins);
        next
    }

    /// Append a selector to the SELECT list.
    pub fn select(&self, selector: Selector) -> Self {
        let mut next = self.identity();
        next.selectors.push(selector);
        next
    }

    /// Replace the whole SELECT list, as `count` and `pluck` do.
    pub fn select_only(&self, selector: Selector) -> Self {
        let mut next = self.identity();
        next.selectors = vec![selector];
        next
    }

    /// True when a join on `table` is already present.
    pub fn joins_table(&self, table: &str) -> bool {
        self.joins.iter().any(|j| j.raw.is_none() && j.table == table)
    }

    // Rendering helpers used by the dialect layer.

    pub fn selector_sql(&self) -> String {
        if self.selectors.is_empty() {
            return format!("{}.*", self.table);
        }
        self.selectors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn condition_sql(&self) -> (String, Vec<Value>) {
        render_conds(&self.conds)
    }

    pub fn having_sql(&self) -> (String, Vec<Value>) {
        render_conds(&self.having)
    }

    pub fn join_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut values = Vec::new();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.fragment());
            values.extend(join.values());
        }
        (sql, values)
    }

    pub fn order_sql(&self) -> String {
        if self.order.is_empty() {
            return String::new();
        }
        format!(" ORDER BY {}", self.order.join(", "))
    }
}

fn normalize_ordering(expr: &str) -> String {
    let upper = expr.trim_end().to_ascii_uppercase();
    if upper.ends_with(" ASC") || upper.ends_with(" DESC") {
        expr.to_string()
    } else {
        format!("{expr} ASC")
    }
}

fn render_conds(conds: &[Cond]) -> (String, Vec<Value>) {
    let fragments: Vec<String> = conds.iter().map(Cond::fragment).collect();
    let values = conds.iter().flat_map(Cond::values).collect();
    (fragments.join(" AND "), values)
}
