use std::collections::HashMap;

use indexmap::IndexMap;

use super::naming::NamingConvention;
use super::source::{Column, Relation, RelationKind, Schema, Source, SourceId};
use crate::{Error, Result};

/// Declared (unresolved) relation on a [`TableDef`].
#[derive(Debug, Clone)]
pub struct RelationDef {
    /// Alias, when the relation is referenced by name instead of by target.
    pub alias: Option<String>,
    /// Target model name.
    pub target: String,
    pub kind: RelationKind,
    /// Explicit foreign-key column; derived from the naming convention when
    /// absent.
    pub foreign_key: Option<String>,
}

/// An explicit mapping descriptor for one model: the compile-time-validated
/// replacement for struct-tag reflection. Built fluently, consumed by
/// [`SchemaBuilder`].
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    table: Option<String>,
    primary_key: Option<String>,
    columns: Vec<Column>,
    relations: Vec<RelationDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            primary_key: None,
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Override the table name derived from the naming convention.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Mark `column` as the primary key. Defaults to the naming
    /// convention's primary-key column when never called.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn belongs_to(self, target: &str) -> Self {
        self.relation(RelationDef {
            alias: None,
            target: target.to_string(),
            kind: RelationKind::BelongsTo,
            foreign_key: None,
        })
    }

    pub fn belongs_to_as(self, alias: &str, target: &str) -> Self {
        self.relation(RelationDef {
            alias: Some(alias.to_string()),
            target: target.to_string(),
            kind: RelationKind::BelongsTo,
            foreign_key: None,
        })
    }

    pub fn has_many(self, target: &str) -> Self {
        self.relation(RelationDef {
            alias: None,
            target: target.to_string(),
            kind: RelationKind::HasMany,
            foreign_key: None,
        })
    }

    pub fn has_many_as(self, alias: &str, target: &str) -> Self {
        self.relation(RelationDef {
            alias: Some(alias.to_string()),
            target: target.to_string(),
            kind: RelationKind::HasMany,
            foreign_key: None,
        })
    }

    pub fn has_one(self, target: &str) -> Self {
        self.relation(RelationDef {
            alias: None,
            target: target.to_string(),
            kind: RelationKind::HasOne,
            foreign_key: None,
        })
    }

    pub fn relation(mut self, def: RelationDef) -> Self {
        self.relations.push(def);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Two-phase schema construction: collect every [`TableDef`] first, then
/// resolve all cross-references at once in [`build`](SchemaBuilder::build).
/// Unknown relation targets are hard errors; there is no pending-relation
/// bookkeeping and registration order never changes the result.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    defs: Vec<TableDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, def: TableDef) -> Self {
        self.defs.push(def);
        self
    }

    pub fn build(self, naming: &dyn NamingConvention) -> Result<Schema> {
        // Phase one: assign ids and freeze table/primary-key names.
        let mut by_name = IndexMap::new();
        let mut sources = Vec::with_capacity(self.defs.len());

        for (index, def) in self.defs.iter().enumerate() {
            let id = SourceId(index);
            let table = def
                .table
                .clone()
                .unwrap_or_else(|| naming.table_name(&def.name));
            let primary_key = def
                .primary_key
                .clone()
                .unwrap_or_else(|| naming.primary_key_column());

            if def.find_column(&primary_key).is_none() {
                return Err(Error::MissingPrimaryKey {
                    table,
                    column: primary_key,
                });
            }

            by_name.insert(def.name.clone(), id);
            sources.push(Source {
                id,
                name: def.name.clone(),
                table,
                primary_key,
                columns: def.columns.clone(),
                relations: Vec::new(),
                live_columns: HashMap::new(),
            });
        }

        // Phase two: resolve relation targets now that every source exists.
        for (index, def) in self.defs.iter().enumerate() {
            let mut relations = Vec::with_capacity(def.relations.len());
            for rel in &def.relations {
                let target = *by_name.get(&rel.target).ok_or_else(|| {
                    Error::UnknownRelation {
                        model: def.name.clone(),
                        target: rel.target.clone(),
                    }
                })?;
                let foreign_key = rel.foreign_key.clone().unwrap_or_else(|| {
                    match rel.kind {
                        // The owning table points at the target.
                        RelationKind::BelongsTo => naming.foreign_key(&rel.target),
                        // The target table points back at the owner.
                        RelationKind::HasMany | RelationKind::HasOne => {
                            naming.foreign_key(&def.name)
                        }
                    }
                });
                relations.push(Relation {
                    name: rel.alias.clone().unwrap_or_else(|| rel.target.clone()),
                    kind: rel.kind,
                    target,
                    foreign_key,
                    aliased: rel.alias.is_some(),
                });
            }
            sources[index].relations = relations;
        }

        Ok(Schema { sources, by_name })
    }
}

impl TableDef {
    fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
