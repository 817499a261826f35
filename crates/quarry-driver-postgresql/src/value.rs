use postgres::types::{private::BytesMut, to_sql_checked, IsNull, ToSql, Type};
use quarry_core::stmt::Value as CoreValue;
use quarry_core::{Error, Result};

/// Bridges a core value to and from the wire types of the `postgres` crate.
#[derive(Debug)]
pub(crate) struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

type BoxError = Box<dyn std::error::Error + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError>
    where
        Self: Sized,
    {
        match &self.0 {
            CoreValue::Bool(value) => value.to_sql(ty, out),
            CoreValue::I64(value) => match *ty {
                Type::INT2 => (*value as i16).to_sql(ty, out),
                Type::INT4 => (*value as i32).to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            CoreValue::F64(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            CoreValue::String(value) => value.to_sql(ty, out),
            CoreValue::Bytes(value) => value.to_sql(ty, out),
            CoreValue::Null => Ok(IsNull::Yes),
            CoreValue::List(_) => {
                Err("list values must be expanded before binding".into())
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Acceptance is decided per value in `to_sql`.
        true
    }

    to_sql_checked!();
}

/// Convert one column of a result row, keyed on the column's wire type.
pub(crate) fn from_sql(row: &postgres::Row, index: usize) -> Result<CoreValue> {
    let ty = row.columns()[index].type_();
    let value = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(index)
            .map(|v| v.map(CoreValue::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(|v| CoreValue::I64(v as i64))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map(|v| v.map(|v| CoreValue::I64(v as i64))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(index)
            .map(|v| v.map(CoreValue::I64)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(|v| CoreValue::F64(v as f64))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(index)
            .map(|v| v.map(CoreValue::F64)),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(index)
            .map(|v| v.map(CoreValue::Bytes)),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(index)
            .map(|v| v.map(CoreValue::String)),
        _ => {
            // Catalog queries surface a few exotic types; take them as
            // text when the driver can.
            row.try_get::<_, Option<String>>(index)
                .map(|v| v.map(CoreValue::String))
        }
    };
    value
        .map(|v| v.unwrap_or(CoreValue::Null))
        .map_err(|err| Error::Driver(err.into()))
}
