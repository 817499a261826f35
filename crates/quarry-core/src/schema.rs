pub mod builder;
pub use builder::{RelationDef, SchemaBuilder, TableDef};

pub mod naming;
pub use naming::{NamingConvention, RailsNaming, SimpleNaming};

pub mod resolver;
pub use resolver::{resolve_joins, resolve_path, JoinTarget};

mod source;
pub use source::{
    Column, ColumnInfo, ColumnType, Relation, RelationKind, Schema, Source, SourceId,
};
