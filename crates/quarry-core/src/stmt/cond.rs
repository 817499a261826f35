use std::collections::HashMap;
use std::fmt;

use super::Value;

/// Comparison operators accepted by [`Cond::Cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// One WHERE/HAVING predicate.
///
/// Every variant renders three ways: a parameterized [`fragment`] with `?`
/// placeholders, the ordered [`values`] matching those placeholders, and a
/// fully substituted `Display` string for logs. The `Display` form is never
/// executed.
///
/// [`fragment`]: Cond::fragment
/// [`values`]: Cond::values
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Equal {
        column: String,
        value: Value,
    },
    Between {
        column: String,
        lower: Value,
        upper: Value,
    },
    /// Membership test. The whole list is one logical bind value; the
    /// dialect layer expands the single marker at render time.
    In {
        column: String,
        values: Vec<Value>,
    },
    Cmp {
        column: String,
        op: Comparator,
        value: Value,
    },
    /// A raw SQL fragment with already-ordered positional bind values.
    Raw {
        fragment: String,
        values: Vec<Value>,
    },
    And(Vec<Cond>),
    Or(Vec<Cond>),
}

impl Cond {
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn between(
        column: impl Into<String>,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> Self {
        Self::Between {
            column: column.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    pub fn cmp(column: impl Into<String>, op: Comparator, value: impl Into<Value>) -> Self {
        Self::Cmp {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// A raw fragment with positional `?` markers (or none at all).
    pub fn raw(fragment: impl Into<String>, values: Vec<Value>) -> Self {
        Self::Raw {
            fragment: fragment.into(),
            values,
        }
    }

    /// A raw fragment using `:name:` placeholders looked up in `binds`.
    ///
    /// Placeholders are whitespace-delimited words of the form `:name:`;
    /// matched names are replaced with `?` in bind order. Unmatched names
    /// pass through literally — the malformed SQL then surfaces as a driver
    /// error at execution time, never a panic here. All other text,
    /// including the original whitespace, is preserved byte for byte.
    pub fn raw_named(fragment: &str, binds: &HashMap<String, Value>) -> Self {
        let mut out = String::with_capacity(fragment.len());
        let mut values = Vec::new();
        let mut rest = fragment;

        while !rest.is_empty() {
            let word_start = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            out.push_str(&rest[..word_start]);
            rest = &rest[word_start..];
            if rest.is_empty() {
                break;
            }

            let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..word_end];
            rest = &rest[word_end..];

            match placeholder_name(word).and_then(|name| binds.get(name)) {
                Some(value) => {
                    out.push('?');
                    values.push(value.clone());
                }
                None => out.push_str(word),
            }
        }

        Self::Raw {
            fragment: out,
            values,
        }
    }

    /// The SQL fragment with positional `?` placeholders.
    pub fn fragment(&self) -> String {
        match self {
            Self::Equal { column, value } if value.is_null() => format!("{column} IS NULL"),
            Self::Equal { column, .. } => format!("{column} = ?"),
            Self::Between { column, .. } => format!("{column} BETWEEN ? AND ?"),
            Self::In { column, .. } => format!("{column} IN (?)"),
            Self::Cmp {
                column,
                op: Comparator::Eq,
                value,
            } if value.is_null() => format!("{column} IS NULL"),
            Self::Cmp {
                column,
                op: Comparator::Ne,
                value,
            } if value.is_null() => format!("{column} IS NOT NULL"),
            Self::Cmp { column, op, .. } => format!("{column} {} ?", op.sql()),
            Self::Raw { fragment, .. } => fragment.clone(),
            Self::And(children) => compose(children, " AND "),
            Self::Or(children) => compose(children, " OR "),
        }
    }

    /// Bind values in placeholder order. The length always equals the number
    /// of placeholders in [`fragment`](Cond::fragment); an `IN` list counts
    /// as one logical value.
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::Equal { value, .. } if value.is_null() => Vec::new(),
            Self::Equal { value, .. } => vec![value.clone()],
            Self::Between { lower, upper, .. } => vec![lower.clone(), upper.clone()],
            Self::In { values, .. } => vec![Value::List(values.clone())],
            Self::Cmp {
                op: Comparator::Eq | Comparator::Ne,
                value,
                ..
            } if value.is_null() => Vec::new(),
            Self::Cmp { value, .. } => vec![value.clone()],
            Self::Raw { values, .. } => values.clone(),
            Self::And(children) | Self::Or(children) => {
                children.iter().flat_map(Cond::values).collect()
            }
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&substitute(&self.fragment(), &self.values()))
    }
}

fn compose(children: &[Cond], op: &str) -> String {
    let fragments: Vec<String> = children.iter().map(Cond::fragment).collect();
    format!("({})", fragments.join(op))
}

fn placeholder_name(word: &str) -> Option<&str> {
    let inner = word.strip_prefix(':')?.strip_suffix(':')?;
    (!inner.is_empty()).then_some(inner)
}

/// Substitute `?` markers with rendered literals, for log output only.
fn substitute(fragment: &str, values: &[Value]) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut values = values.iter();
    for c in fragment.chars() {
        if c == '?' {
            match values.next() {
                Some(value) => out.push_str(&value.sql_literal()),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}
