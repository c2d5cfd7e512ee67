use bytes::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use std::error::Error;
use time::{Date, PrimitiveDateTime};
use trophy_core::Value;
use uuid::Uuid;

/// Bridge between [`Value`] and the binary protocol of tokio-postgres.
#[derive(Debug)]
pub(crate) struct ValueHolder(pub(crate) Value);

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        ValueHolder(value)
    }
}

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Self::from_sql_nullable(ty, Some(raw))
    }

    fn from_sql_null(ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Self::from_sql_nullable(ty, None)
    }

    fn from_sql_nullable(
        ty: &Type,
        raw: Option<&'a [u8]>,
    ) -> Result<Self, Box<dyn Error + Sync + Send>> {
        macro_rules! to_value {
            ($ty_var:ident, $raw:ident, $($($ty:path)|+ => ($value:path, $source:ty),)+) => {
                match *$ty_var {
                    $($($ty)|+ => $value(match $raw {
                        Some(raw) => Some(<$source>::from_sql($ty_var, raw)?.into()),
                        None => None,
                    }),)+
                    _ if $raw.is_none() => Value::Null,
                    _ => {
                        return Err(trophy_core::Error::msg(format!(
                            "Cannot decode the postgres type `{}`",
                            $ty_var
                        ))
                        .into());
                    }
                }
            };
        }
        let value = to_value!(ty, raw,
            Type::BOOL => (Value::Boolean, bool),
            Type::INT4 => (Value::Int32, i32),
            Type::INT8 => (Value::Int64, i64),
            Type::FLOAT8 => (Value::Float64, f64),
            Type::VARCHAR | Type::TEXT | Type::NAME | Type::BPCHAR => (Value::Varchar, String),
            Type::BYTEA => (Value::Blob, Vec<u8>),
            Type::DATE => (Value::Date, Date),
            Type::TIMESTAMP => (Value::Timestamp, PrimitiveDateTime),
            Type::UUID => (Value::Uuid, Uuid),
        );
        Ok(value.into())
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>>
    where
        Self: Sized,
    {
        match &self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Boolean(v) => v.to_sql_checked(ty, out),
            Value::Int32(v) => match *ty {
                Type::INT8 => v.map(i64::from).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Int64(v) => v.to_sql_checked(ty, out),
            Value::UInt64(v) => v.map(i64::try_from).transpose()?.to_sql_checked(ty, out),
            Value::Float64(v) => v.to_sql_checked(ty, out),
            Value::Varchar(v) => v.to_sql_checked(ty, out),
            Value::Blob(v) => v.as_deref().to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}
