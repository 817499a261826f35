use std::collections::{HashSet, VecDeque};

use super::source::{Relation, RelationKind, Schema, Source, SourceId};
use crate::stmt::{Join, JoinKind};
use crate::{Error, Result};

/// What a join request names: either a target model or a relation alias.
/// A model name only ever matches unaliased relations and an alias only
/// ever matches aliased ones; the two namespaces never cross.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    Model(String),
    Alias(String),
}

impl JoinTarget {
    fn matches(&self, schema: &Schema, rel: &Relation) -> bool {
        match self {
            JoinTarget::Model(name) => !rel.aliased && schema[rel.target].name == *name,
            JoinTarget::Alias(alias) => rel.aliased && rel.name == *alias,
        }
    }
}

/// Breadth-first search from `from` for the shortest relation path whose
/// final edge matches `target`. Relations are explored in declaration
/// order, so equal-length candidates resolve to the first one declared.
/// Returns `None` when no path exists.
pub fn resolve_path<'a>(
    schema: &'a Schema,
    from: SourceId,
    target: &JoinTarget,
) -> Option<Vec<&'a Relation>> {
    let mut visited = HashSet::new();
    visited.insert(from);

    let mut queue = VecDeque::new();
    queue.push_back((from, Vec::new()));

    while let Some((current, path)) = queue.pop_front() {
        for rel in &schema[current].relations {
            if target.matches(schema, rel) {
                let mut path: Vec<&Relation> = path.clone();
                path.push(rel);
                return Some(path);
            }
            // Mark at enqueue so a source is queued at most once.
            if visited.insert(rel.target) {
                let mut next = path.clone();
                next.push(rel);
                queue.push_back((rel.target, next));
            }
        }
    }

    None
}

/// Resolve `target` from `from` and turn the path into JOIN clauses, one
/// per hop. Fails with [`Error::UnresolvedJoin`] when no path exists.
pub fn resolve_joins(schema: &Schema, from: SourceId, target: &JoinTarget) -> Result<Vec<Join>> {
    let path = resolve_path(schema, from, target).ok_or_else(|| Error::UnresolvedJoin {
        from: schema[from].name.clone(),
        target: match target {
            JoinTarget::Model(name) | JoinTarget::Alias(name) => name.clone(),
        },
    })?;

    let mut joins = Vec::with_capacity(path.len());
    let mut current: &Source = &schema[from];
    for rel in path {
        let next = &schema[rel.target];
        let on = match rel.kind {
            // The current table carries the key.
            RelationKind::BelongsTo => format!(
                "{}.{} = {}.{}",
                next.table, next.primary_key, current.table, rel.foreign_key
            ),
            // The joined table carries the key.
            RelationKind::HasMany | RelationKind::HasOne => format!(
                "{}.{} = {}.{}",
                next.table, rel.foreign_key, current.table, current.primary_key
            ),
        };
        joins.push(Join::new(JoinKind::Left, &next.table).on(on));
        current = next;
    }

    Ok(joins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::builder::{SchemaBuilder, TableDef};
    use crate::schema::naming::RailsNaming;
    use crate::schema::source::{Column, ColumnType};

    fn id_col() -> Column {
        Column::new("id", ColumnType::BigInt)
    }

    // User has many Posts, each Post has many Comments; User also has an
    // aliased relation "authored" pointing straight at Comment.
    fn schema() -> Schema {
        SchemaBuilder::new()
            .table(
                TableDef::new("User")
                    .column(id_col())
                    .has_many("Post")
                    .has_many_as("authored", "Comment"),
            )
            .table(
                TableDef::new("Post")
                    .column(id_col())
                    .column(Column::new("user_id", ColumnType::BigInt))
                    .belongs_to("User")
                    .has_many("Comment"),
            )
            .table(
                TableDef::new("Comment")
                    .column(id_col())
                    .column(Column::new("post_id", ColumnType::BigInt))
                    .column(Column::new("user_id", ColumnType::BigInt))
                    .belongs_to("Post"),
            )
            .build(&RailsNaming)
            .unwrap()
    }

    fn source_id(schema: &Schema, name: &str) -> SourceId {
        schema.source_by_name(name).unwrap().id
    }

    #[test]
    fn direct_relation_resolves_in_one_hop() {
        let schema = schema();
        let from = source_id(&schema, "Post");
        let path = resolve_path(&schema, from, &JoinTarget::Model("User".into())).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].kind, RelationKind::BelongsTo);
    }

    #[test]
    fn transitive_relation_walks_intermediate_tables() {
        let schema = schema();
        let from = source_id(&schema, "Comment");
        // Comment -> Post -> User.
        let path = resolve_path(&schema, from, &JoinTarget::Model("User".into())).unwrap();
        assert_eq!(path.len(), 2);

        let joins = resolve_joins(&schema, from, &JoinTarget::Model("User".into())).unwrap();
        assert_eq!(joins.len(), 2);
        assert_eq!(
            joins[0].fragment(),
            "LEFT JOIN posts ON posts.id = comments.post_id"
        );
        assert_eq!(
            joins[1].fragment(),
            "LEFT JOIN users ON users.id = posts.user_id"
        );
    }

    #[test]
    fn model_lookup_ignores_aliased_relations() {
        let schema = schema();
        let from = source_id(&schema, "User");
        // "Comment" must go through Post, never through the "authored" alias.
        let path = resolve_path(&schema, from, &JoinTarget::Model("Comment".into())).unwrap();
        assert_eq!(path.len(), 2);
        assert!(path.iter().all(|r| !r.aliased));
    }

    #[test]
    fn alias_lookup_matches_only_the_alias() {
        let schema = schema();
        let from = source_id(&schema, "User");
        let path = resolve_path(&schema, from, &JoinTarget::Alias("authored".into())).unwrap();
        assert_eq!(path.len(), 1);
        assert!(path[0].aliased);

        // An alias that exists on no relation resolves to nothing.
        assert!(resolve_path(&schema, from, &JoinTarget::Alias("written".into())).is_none());
    }

    #[test]
    fn has_many_join_keys_on_the_joined_table() {
        let schema = schema();
        let from = source_id(&schema, "User");
        let joins = resolve_joins(&schema, from, &JoinTarget::Model("Post".into())).unwrap();
        assert_eq!(
            joins[0].fragment(),
            "LEFT JOIN posts ON posts.user_id = users.id"
        );
    }

    #[test]
    fn equal_depth_tie_follows_declaration_order() {
        // Two distinct two-hop paths to Tag; the relation declared first
        // on Org (through Alpha) must win, and keep winning.
        let schema = SchemaBuilder::new()
            .table(
                TableDef::new("Org")
                    .column(id_col())
                    .has_many("Alpha")
                    .has_many("Beta"),
            )
            .table(
                TableDef::new("Alpha")
                    .column(id_col())
                    .column(Column::new("org_id", ColumnType::BigInt))
                    .has_many("Tag"),
            )
            .table(
                TableDef::new("Beta")
                    .column(id_col())
                    .column(Column::new("org_id", ColumnType::BigInt))
                    .has_many("Tag"),
            )
            .table(TableDef::new("Tag").column(id_col()))
            .build(&RailsNaming)
            .unwrap();

        let from = source_id(&schema, "Org");
        for _ in 0..20 {
            let path = resolve_path(&schema, from, &JoinTarget::Model("Tag".into())).unwrap();
            assert_eq!(path.len(), 2);
            assert_eq!(schema[path[0].target].name, "Alpha");
        }
    }

    #[test]
    fn cycles_terminate() {
        // User <-> Post reference each other; asking for a model that does
        // not exist must come back empty instead of looping.
        let schema = schema();
        let from = source_id(&schema, "User");
        assert!(resolve_path(&schema, from, &JoinTarget::Model("Tag".into())).is_none());
    }

    #[test]
    fn unresolved_join_is_a_typed_error() {
        let schema = schema();
        let from = source_id(&schema, "User");
        let err = resolve_joins(&schema, from, &JoinTarget::Model("Tag".into())).unwrap_err();
        assert!(matches!(err, Error::UnresolvedJoin { .. }));
    }
}
