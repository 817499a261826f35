use std::collections::HashMap;
use std::ops;

use indexmap::IndexMap;

use crate::stmt::Value;

/// Identifies a [`Source`] within its [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub usize);

/// Generic column types the dialects know how to map to native SQL types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Integer,
    BigInt,
    Float,
    Text,
    Binary,
    Timestamp,
}

/// A declared column in a mapping descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    /// Declared size; zero means unspecified.
    pub size: usize,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            size: 0,
            nullable: true,
            default: None,
        }
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    HasOne,
}

/// A resolved foreign-key association between two sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Display name: the alias when aliased, else the target model name.
    pub name: String,
    pub kind: RelationKind,
    pub target: SourceId,
    /// Column holding the key: on the owning table for `BelongsTo`, on the
    /// target table for `HasMany`/`HasOne`.
    pub foreign_key: String,
    pub aliased: bool,
}

/// Schema-introspection result for one live column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub table: String,
    pub sql_type: String,
    /// Declared length; -1 when the backend reports none.
    pub length: i64,
    pub nullable: bool,
    /// Zero-based position within the table.
    pub ordinal: usize,
}

/// Mapping metadata for one table: the model name, SQL table name, primary
/// key, declared columns, resolved relations, and (once connected) the
/// introspected live columns. Built once per registered model and immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    /// Model name, e.g. `Post`.
    pub name: String,
    /// SQL table name, e.g. `posts`.
    pub table: String,
    /// Primary-key column name, unqualified.
    pub primary_key: String,
    pub columns: Vec<Column>,
    pub relations: Vec<Relation>,
    /// Live columns reported by the dialect's introspection query. Empty
    /// when the table does not exist yet.
    pub live_columns: HashMap<String, ColumnInfo>,
}

impl Source {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key qualified by the table, e.g. `posts.id`.
    pub fn qualified_primary_key(&self) -> String {
        format!("{}.{}", self.table, self.primary_key)
    }
}

/// An immutable set of resolved sources, indexed by [`SourceId`].
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) sources: Vec<Source>,
    pub(crate) by_name: IndexMap<String, SourceId>,
}

impl Schema {
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn sources_mut(&mut self) -> impl Iterator<Item = &mut Source> {
        self.sources.iter_mut()
    }

    pub fn source_by_name(&self, name: &str) -> Option<&Source> {
        self.by_name.get(name).map(|id| &self[*id])
    }

    pub fn source_by_table(&self, table: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.table == table)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ops::Index<SourceId> for Schema {
    type Output = Source;

    fn index(&self, id: SourceId) -> &Source {
        &self.sources[id.0]
    }
}
