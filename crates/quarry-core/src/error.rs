use crate::stmt::Value;

/// An error that can occur in quarry.
///
/// Configuration mistakes (unknown dialect names, unresolvable relation
/// targets) surface at connection-setup time; everything produced while
/// executing a query is either a typed variant callers can branch on or a
/// transparent driver error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A single-row retrieval matched no rows. Collection retrievals never
    /// produce this; they yield an empty vector instead.
    #[error("no rows returned by query")]
    NoRows,

    /// The dialect registry has no entry under the requested name.
    #[error("could not locate dialect '{0}'")]
    UnknownDialect(String),

    /// No registered source (mapped model) matches the given name.
    #[error("no mapped source named '{0}'")]
    UnknownSource(String),

    /// A relation declaration points at a model that was never registered.
    #[error("unknown relation target '{target}' declared on '{model}'")]
    UnknownRelation { model: String, target: String },

    /// The relation resolver found no path to the requested join target.
    #[error("could not resolve join target '{target}' from '{from}'")]
    UnresolvedJoin { from: String, target: String },

    /// A table definition names a primary key column it never declares.
    #[error("table '{table}' declares no column for primary key '{column}'")]
    MissingPrimaryKey { table: String, column: String },

    /// A result row has no column under the requested name.
    #[error("column '{0}' is not present in the result row")]
    MissingColumn(String),

    /// A value could not be converted to the destination type.
    #[error("cannot convert {value} to {target}")]
    TypeMismatch {
        value: &'static str,
        target: &'static str,
    },

    /// The configured limit of concurrently open transactions was reached
    /// with the non-blocking policy in effect. Retry after a slot frees.
    #[error("transaction limit reached")]
    TransactionLimit,

    /// An error propagated verbatim from the database driver.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

impl Error {
    pub fn type_mismatch(value: &Value, target: &'static str) -> Self {
        Self::TypeMismatch {
            value: value.kind(),
            target,
        }
    }

    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }

    pub fn is_transaction_limit(&self) -> bool {
        matches!(self, Self::TransactionLimit)
    }
}
