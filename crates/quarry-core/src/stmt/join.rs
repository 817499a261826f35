use super::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
    FullOuter,
    RightOuter,
}

impl JoinKind {
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Inner => "INNER",
            Self::FullOuter => "FULL OUTER",
            Self::RightOuter => "RIGHT OUTER",
        }
    }
}

/// One JOIN clause. When `raw` is present it overrides kind, table and
/// matches entirely; the resolver-produced form renders
/// `<KIND> JOIN <table> [AS alias] ON <matches AND-ed>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub matches: Vec<String>,
    pub raw: Option<RawJoin>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawJoin {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: None,
            matches: Vec::new(),
            raw: None,
        }
    }

    pub fn aliased(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn on(mut self, matches: impl Into<String>) -> Self {
        self.matches.push(matches.into());
        self
    }

    /// A hand-written JOIN clause bypassing relation resolution.
    pub fn raw_sql(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            kind: JoinKind::Inner,
            table: String::new(),
            alias: None,
            matches: Vec::new(),
            raw: Some(RawJoin {
                sql: sql.into(),
                args,
            }),
        }
    }

    pub fn fragment(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.sql.clone();
        }
        let mut out = format!("{} JOIN {}", self.kind.sql(), self.table);
        if let Some(alias) = &self.alias {
            out.push_str(" AS ");
            out.push_str(alias);
        }
        out.push_str(" ON ");
        out.push_str(&self.matches.join(" AND "));
        out
    }

    pub fn values(&self) -> Vec<Value> {
        match &self.raw {
            Some(raw) => raw.args.clone(),
            None => Vec::new(),
        }
    }
}
