use std::sync::Arc;

use quarry_core::driver::{Connection, ExecResult, Row};
use quarry_core::schema::{
    NamingConvention, RailsNaming, Schema, SchemaBuilder, SourceId, TableDef,
};
use quarry_core::stmt::{FromValue, Value};
use quarry_core::{Error, Result};
use quarry_sql::{Dialect, DialectRegistry};

use crate::transaction::TxSlots;
use crate::{Model, Scope, Transaction};

/// A connected database: driver connection, dialect, resolved schema, and
/// the transaction slots. The entry point for every operation.
#[derive(Debug)]
pub struct Database {
    connection: Box<dyn Connection>,
    dialect: Arc<dyn Dialect>,
    schema: Schema,
    naming: Box<dyn NamingConvention>,
    db_name: String,
    slots: TxSlots,
}

/// Collects model registrations and configuration, then connects.
pub struct DatabaseBuilder {
    registry: DialectRegistry,
    naming: Box<dyn NamingConvention>,
    defs: Vec<fn(&dyn NamingConvention) -> TableDef>,
}

impl DatabaseBuilder {
    /// Register a model. Order never matters; relation targets resolve
    /// after every registration is in.
    pub fn model<M: Model>(mut self) -> Self {
        self.defs.push(M::table);
        self
    }

    pub fn naming(mut self, naming: impl NamingConvention + 'static) -> Self {
        self.naming = Box::new(naming);
        self
    }

    /// Replace the default dialect registry, e.g. to add a custom dialect.
    pub fn registry(mut self, registry: DialectRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Resolve the schema, look up the dialect, and introspect live
    /// columns over `connection`.
    pub fn build(
        self,
        dialect: &str,
        db_name: impl Into<String>,
        connection: Box<dyn Connection>,
    ) -> Result<Database> {
        let dialect = self.registry.get(dialect)?;
        let db_name = db_name.into();

        let mut builder = SchemaBuilder::new();
        for def in &self.defs {
            builder = builder.table(def(self.naming.as_ref()));
        }
        let mut schema = builder.build(self.naming.as_ref())?;

        // Tables may not exist yet; introspection failure just means no
        // live columns.
        for source in schema.sources_mut() {
            source.live_columns = match dialect.columns_in_table(
                connection.as_ref(),
                &db_name,
                &source.table,
            ) {
                Ok(columns) => columns,
                Err(err) => {
                    tracing::debug!(table = %source.table, %err, "introspection failed");
                    Default::default()
                }
            };
        }

        Ok(Database {
            connection,
            dialect,
            schema,
            naming: self.naming,
            db_name,
            slots: TxSlots::unbounded(),
        })
    }
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder {
            registry: DialectRegistry::default(),
            naming: Box::new(RailsNaming),
            defs: Vec::new(),
        }
    }

    /// A fresh scope over every row of `M`'s table.
    pub fn scope<M: Model>(&self) -> Result<Scope<'_, M>> {
        let source = self
            .schema
            .source_by_name(M::NAME)
            .ok_or_else(|| Error::UnknownSource(M::NAME.to_string()))?;
        Ok(Scope::new(self, source.id))
    }

    pub fn find<M: Model>(&self, id: impl Into<Value>) -> Result<M> {
        self.scope::<M>()?.find(id)
    }

    /// Insert when the primary key is unset, otherwise update in place.
    /// Inserts store the generated key back into the model.
    pub fn save<M: Model>(&self, model: &mut M) -> Result<()> {
        let source = self
            .schema
            .source_by_name(M::NAME)
            .ok_or_else(|| Error::UnknownSource(M::NAME.to_string()))?;
        let values = model.values();

        if model.primary_key().is_zero() {
            let (sql, args) =
                self.dialect
                    .insert_sql(&source.table, &source.primary_key, &values);
            if self.dialect.create_exec() {
                let result = self.run_exec(&sql, &args)?;
                if let Some(id) = result.last_insert_id {
                    model.set_primary_key(Value::I64(id))?;
                }
            } else {
                // The INSERT returns the key as a single-column row.
                let rows = self.run_query(&sql, &args)?;
                let id = rows
                    .first()
                    .and_then(|row| row.value(0))
                    .cloned()
                    .ok_or(Error::NoRows)?;
                model.set_primary_key(id)?;
            }
        } else {
            let scope = quarry_core::stmt::Scope::new(&source.table, &source.primary_key)
                .equal_to(source.qualified_primary_key(), model.primary_key());
            let (sql, args) = self.dialect.update_sql(&scope, &values);
            self.run_exec(&sql, &args)?;
        }
        Ok(())
    }

    /// Issue `CREATE TABLE` for every registered source, in registration
    /// order so referenced tables exist before their dependents' foreign
    /// keys. Existing tables are tolerated where the dialect supports
    /// `IF NOT EXISTS`.
    pub fn create_tables(&self) -> Result<()> {
        for source in self.schema.sources() {
            for sql in self.dialect.create_table_sql(&self.schema, source, true) {
                self.run_exec(&sql, &[])?;
            }
        }
        Ok(())
    }

    /// Drop every registered table, dependents first.
    pub fn drop_tables(&self) -> Result<()> {
        for source in self.schema.sources().iter().rev() {
            let sql = self.dialect.drop_table_sql(&source.table);
            self.run_exec(&sql, &[])?;
        }
        Ok(())
    }

    /// Open a transaction, taking one slot. With a bounded, non-blocking
    /// configuration this fails fast with [`Error::TransactionLimit`].
    pub fn begin_transaction(&self) -> Result<Transaction<'_>> {
        self.slots.acquire()?;
        tracing::debug!("begin transaction");
        if let Err(err) = self.connection.begin() {
            self.slots.release();
            return Err(err);
        }
        Ok(Transaction::new(self))
    }

    /// Bound the number of concurrently open transactions. `block` decides
    /// what a full table does: wait for a free slot, or fail fast.
    pub fn set_transaction_limit(&self, max: usize, block: bool) {
        self.slots.configure(max, block);
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn naming(&self) -> &dyn NamingConvention {
        self.naming.as_ref()
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Run a raw query through the connection, with logging.
    pub fn query_raw(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.run_query(sql, params)
    }

    /// Run a raw statement through the connection, with logging.
    pub fn execute_raw(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.run_exec(sql, params)
    }

    /// Pluck a single value out of a raw single-row query.
    pub fn query_value<V: FromValue>(&self, sql: &str, params: &[Value]) -> Result<V> {
        let rows = self.run_query(sql, params)?;
        let value = rows
            .first()
            .and_then(|row| row.value(0))
            .cloned()
            .ok_or(Error::NoRows)?;
        V::from_value(value)
    }

    pub(crate) fn run_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        tracing::debug!(sql, ?params, "query");
        self.connection.query(sql, params)
    }

    pub(crate) fn run_exec(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        tracing::debug!(sql, ?params, "execute");
        self.connection.execute(sql, params)
    }

    pub(crate) fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    pub(crate) fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn source(&self, id: SourceId) -> &quarry_core::schema::Source {
        &self.schema[id]
    }

    pub(crate) fn slots(&self) -> &TxSlots {
        &self.slots
    }
}
