use crate::{DATE_FORMAT, Error, Result, TIMESTAMP_FORMAT, Value, truncate_long};
use anyhow::Context;
use std::{any, borrow::Cow};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Drivers decode cells into whatever variant their wire protocol produces
/// (SQLite hands back text for dates, MySQL hands back bytes for strings), so
/// `try_from_value` accepts every representation a supported backend may
/// return for the type, not only the canonical variant.
///
/// ```rust
/// use trophy_core::{AsValue, Value};
/// let v = 42i64.as_value();
/// assert!(matches!(v, Value::Int64(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL of this type.
    fn as_empty_value() -> Value;
    /// Convert into the owned canonical [`Value`].
    fn as_value(self) -> Value;
    /// Attempt to convert a decoded [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} into {}",
        value,
        any::type_name::<T>()
    ))
}

fn utf8(bytes: &[u8]) -> Result<Cow<'_, str>> {
    Ok(Cow::Borrowed(
        std::str::from_utf8(bytes).context("The value is not valid UTF-8 text")?,
    ))
}

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            Value::UInt64(Some(v)) => Ok(v != 0),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for i64 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) => Ok(v),
            Value::Int32(Some(v)) => Ok(v as i64),
            Value::UInt64(Some(v)) => i64::try_from(v)
                .map_err(|_| Error::msg(format!("Value {v}: u64 is out of range for i64"))),
            Value::Varchar(Some(ref v)) => v
                .trim()
                .parse()
                .with_context(|| format!("Cannot parse `{}` as i64", truncate_long!(v))),
            Value::Blob(Some(ref v)) => utf8(v)?
                .trim()
                .parse()
                .context("Cannot parse the bytes as i64"),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for i32 {
    fn as_empty_value() -> Value {
        Value::Int32(None)
    }
    fn as_value(self) -> Value {
        Value::Int32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let v = i64::try_from_value(value)?;
        i32::try_from(v).map_err(|_| Error::msg(format!("Value {v}: i64 is out of range for i32")))
    }
}

impl AsValue for u32 {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self as i64))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let v = i64::try_from_value(value)?;
        u32::try_from(v).map_err(|_| Error::msg(format!("Value {v}: i64 is out of range for u32")))
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => Ok(utf8(&v)?.into_owned()),
            Value::Uuid(Some(v)) => Ok(v.hyphenated().to_string()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(ref v)) => Date::parse(v.trim(), DATE_FORMAT)
                .with_context(|| format!("Cannot parse `{}` as a date", truncate_long!(v))),
            Value::Blob(Some(ref v)) => {
                Date::parse(utf8(v)?.trim(), DATE_FORMAT).context("Cannot parse the bytes as a date")
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => PrimitiveDateTime::parse(v.trim(), TIMESTAMP_FORMAT)
                .with_context(|| format!("Cannot parse `{}` as a timestamp", truncate_long!(v))),
            Value::Blob(Some(ref v)) => PrimitiveDateTime::parse(utf8(v)?.trim(), TIMESTAMP_FORMAT)
                .context("Cannot parse the bytes as a timestamp"),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(ref v)) => Uuid::parse_str(v.trim())
                .with_context(|| format!("Cannot parse `{}` as a uuid", truncate_long!(v))),
            Value::Blob(Some(ref v)) if v.len() == 16 => {
                Uuid::from_slice(v).context("Cannot decode the bytes as a uuid")
            }
            Value::Blob(Some(ref v)) => {
                Uuid::parse_str(utf8(v)?.trim()).context("Cannot parse the bytes as a uuid")
            }
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn integers_across_representations() {
        assert_eq!(i64::try_from_value(Value::Int32(Some(-3))).unwrap(), -3);
        assert_eq!(i64::try_from_value(Value::UInt64(Some(7))).unwrap(), 7);
        assert_eq!(i64::try_from_value(Value::Varchar(Some("12".into()))).unwrap(), 12);
        assert!(i64::try_from_value(Value::UInt64(Some(u64::MAX))).is_err());
        assert!(u32::try_from_value(Value::Int64(Some(-1))).is_err());
        assert!(i64::try_from_value(Value::Null).is_err());
    }

    #[test]
    fn text_from_bytes() {
        let value = Value::Blob(Some(b"First Join".to_vec().into_boxed_slice()));
        assert_eq!(String::try_from_value(value).unwrap(), "First Join");
    }

    #[test]
    fn temporal_from_text_and_wider_types() {
        assert_eq!(
            Date::try_from_value(Value::Varchar(Some("2025-12-31".into()))).unwrap(),
            date!(2025 - 12 - 31)
        );
        assert_eq!(
            Date::try_from_value(Value::Timestamp(Some(datetime!(2025-12-31 0:00)))).unwrap(),
            date!(2025 - 12 - 31)
        );
        assert_eq!(
            PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2025-12-31 23:59:58.125".into()
            )))
            .unwrap(),
            datetime!(2025-12-31 23:59:58.125)
        );
        assert!(Date::try_from_value(Value::Varchar(Some("yesterday".into()))).is_err());
    }

    #[test]
    fn uuid_from_every_representation() {
        let uuid = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        assert_eq!(
            Uuid::try_from_value(Value::Varchar(Some(uuid.to_string()))).unwrap(),
            uuid
        );
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(uuid.as_bytes().to_vec().into()))).unwrap(),
            uuid
        );
        assert_eq!(
            Uuid::try_from_value(Value::Blob(Some(
                uuid.hyphenated().to_string().into_bytes().into()
            )))
            .unwrap(),
            uuid
        );
    }

    #[test]
    fn options() {
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::try_from_value(Value::Int64(Some(4))).unwrap(), Some(4));
        assert_eq!(None::<String>.as_value(), Value::Varchar(None));
    }
}
