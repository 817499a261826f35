use quarry_core::driver::Row;
use quarry_core::schema::{NamingConvention, TableDef};
use quarry_core::stmt::Value;
use quarry_core::Result;

/// A struct mapped to a table.
///
/// The mapping is an explicit descriptor returned by [`Model::table`];
/// nothing is inferred from the struct's fields at runtime. The naming
/// convention is handed in so descriptors can stay name-free and pick up
/// whatever convention the database was built with.
///
/// ```
/// use quarry::{Column, ColumnType, Model, NamingConvention, Row, TableDef, Value};
///
/// #[derive(Debug, Default)]
/// struct Post {
///     id: i64,
///     title: String,
/// }
///
/// impl Model for Post {
///     const NAME: &'static str = "Post";
///
///     fn table(_naming: &dyn NamingConvention) -> TableDef {
///         TableDef::new(Self::NAME)
///             .column(Column::new("id", ColumnType::BigInt))
///             .column(Column::new("title", ColumnType::Text).size(255))
///     }
///
///     fn from_row(row: &Row) -> quarry::Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             title: row.get("title")?,
///         })
///     }
///
///     fn values(&self) -> Vec<(String, Value)> {
///         vec![("title".into(), Value::from(&self.title))]
///     }
///
///     fn primary_key(&self) -> Value {
///         self.id.into()
///     }
///
///     fn set_primary_key(&mut self, value: Value) -> quarry::Result<()> {
///         self.id = i64::from_value(value)?;
///         Ok(())
///     }
/// }
/// # use quarry::FromValue;
/// ```
pub trait Model: Sized {
    /// Model name used for table naming and relation targets.
    const NAME: &'static str;

    /// The mapping descriptor: columns, primary key, relations.
    fn table(naming: &dyn NamingConvention) -> TableDef;

    /// Map one result row back into the struct.
    fn from_row(row: &Row) -> Result<Self>;

    /// Column/value pairs written on insert and update. The primary key is
    /// excluded; the save path manages it.
    fn values(&self) -> Vec<(String, Value)>;

    /// Current primary-key value. Null or zero means not yet persisted.
    fn primary_key(&self) -> Value;

    /// Store a generated primary key after insert.
    fn set_primary_key(&mut self, value: Value) -> Result<()>;
}
