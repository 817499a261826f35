use std::fmt;

use super::Value;

/// One SELECT-list entry. The default selection for a scope is
/// [`Selector::WholeTable`], rendering `table.*`.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    WholeTable {
        table: String,
    },
    Column {
        table: String,
        column: String,
        alias: Option<String>,
    },
    /// A raw SQL expression, e.g. an aggregate call.
    Formula {
        formula: String,
        alias: Option<String>,
    },
    /// A literal value selected under an alias.
    Literal {
        value: Value,
        alias: String,
    },
}

impl Selector {
    pub fn whole_table(table: impl Into<String>) -> Self {
        Self::WholeTable {
            table: table.into(),
        }
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column {
            table: table.into(),
            column: column.into(),
            alias: None,
        }
    }

    pub fn column_as(
        table: impl Into<String>,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self::Column {
            table: table.into(),
            column: column.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn formula(formula: impl Into<String>) -> Self {
        Self::Formula {
            formula: formula.into(),
            alias: None,
        }
    }

    pub fn formula_as(formula: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Formula {
            formula: formula.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn literal(value: impl Into<Value>, alias: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            alias: alias.into(),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WholeTable { table } => write!(f, "{table}.*"),
            Self::Column {
                table,
                column,
                alias: None,
            } => write!(f, "{table}.{column}"),
            Self::Column {
                table,
                column,
                alias: Some(alias),
            } => write!(f, "{table}.{column} AS {alias}"),
            Self::Formula {
                formula,
                alias: None,
            } => f.write_str(formula),
            Self::Formula {
                formula,
                alias: Some(alias),
            } => write!(f, "{formula} AS {alias}"),
            Self::Literal { value, alias } => {
                write!(f, "{} AS {alias}", value.sql_literal())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering() {
        assert_eq!(Selector::whole_table("posts").to_string(), "posts.*");
        assert_eq!(
            Selector::column("posts", "title").to_string(),
            "posts.title"
        );
        assert_eq!(
            Selector::column_as("posts", "title", "t").to_string(),
            "posts.title AS t"
        );
        assert_eq!(
            Selector::formula_as("COUNT(posts.id)", "total").to_string(),
            "COUNT(posts.id) AS total"
        );
        assert_eq!(
            Selector::literal("draft", "state").to_string(),
            "'draft' AS state"
        );
    }
}
