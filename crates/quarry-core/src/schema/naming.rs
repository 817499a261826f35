use std::fmt;

use heck::ToSnakeCase;

/// Pure naming policy consumed by schema building. The core never defines
/// naming rules of its own; it only calls these functions.
pub trait NamingConvention: fmt::Debug + Send + Sync {
    /// Model name to SQL table name.
    fn table_name(&self, model: &str) -> String;

    /// Field name to column name.
    fn column_name(&self, field: &str) -> String;

    /// Foreign-key column pointing at `model`.
    fn foreign_key(&self, model: &str) -> String;

    /// Column name of the primary key.
    fn primary_key_column(&self) -> String;

    /// Audit column names. Never written automatically by the update path.
    fn created_column(&self) -> String;
    fn updated_column(&self) -> String;
}

/// Rails-style naming: pluralized snake_case tables, `<model>_id` foreign
/// keys, `id` primary keys, `created_at`/`updated_at` audit columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RailsNaming;

impl NamingConvention for RailsNaming {
    fn table_name(&self, model: &str) -> String {
        pluralizer::pluralize(&model.to_snake_case(), 2, false)
    }

    fn column_name(&self, field: &str) -> String {
        field.to_snake_case()
    }

    fn foreign_key(&self, model: &str) -> String {
        format!("{}_id", model.to_snake_case())
    }

    fn primary_key_column(&self) -> String {
        "id".to_string()
    }

    fn created_column(&self) -> String {
        "created_at".to_string()
    }

    fn updated_column(&self) -> String {
        "updated_at".to_string()
    }
}

/// Lowercase-everything naming: table and column names are the lowercased
/// model and field names, no pluralization.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNaming;

impl NamingConvention for SimpleNaming {
    fn table_name(&self, model: &str) -> String {
        model.to_lowercase()
    }

    fn column_name(&self, field: &str) -> String {
        field.to_lowercase()
    }

    fn foreign_key(&self, model: &str) -> String {
        format!("{}id", model.to_lowercase())
    }

    fn primary_key_column(&self) -> String {
        "id".to_string()
    }

    fn created_column(&self) -> String {
        "creation".to_string()
    }

    fn updated_column(&self) -> String {
        "modified".to_string()
    }
}
