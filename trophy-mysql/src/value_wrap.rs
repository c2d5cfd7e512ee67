use mysql_async::{FromValueError, Value as MySQLValue};
use time::{Date, Month, PrimitiveDateTime, Time};
use trophy_core::{Error, Result, Value};

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl TryFrom<MySQLValue> for ValueWrap {
    type Error = FromValueError;

    /// Text columns come back as bytes, `AsValue` decodes them on demand.
    fn try_from(value: MySQLValue) -> Result<Self, Self::Error> {
        Ok(match value {
            MySQLValue::NULL => Value::Null,
            MySQLValue::Bytes(v) => Value::Blob(Some(v.into())),
            MySQLValue::Int(v) => Value::Int64(Some(v)),
            MySQLValue::UInt(v) => Value::UInt64(Some(v)),
            MySQLValue::Float(v) => Value::Float64(Some(v.into())),
            MySQLValue::Double(v) => Value::Float64(Some(v)),
            MySQLValue::Date(year, month, day, hour, minute, second, micro) => {
                let timestamp = Month::try_from(month)
                    .ok()
                    .and_then(|month| Date::from_calendar_date(year as _, month, day).ok())
                    .zip(Time::from_hms_micro(hour, minute, second, micro).ok())
                    .map(|(date, time)| PrimitiveDateTime::new(date, time));
                match timestamp {
                    Some(v) => Value::Timestamp(Some(v)),
                    None => return Err(FromValueError(value)),
                }
            }
            MySQLValue::Time(..) => return Err(FromValueError(value)),
        }
        .into())
    }
}

impl TryFrom<ValueWrap> for MySQLValue {
    type Error = Error;

    fn try_from(value: ValueWrap) -> Result<Self, Self::Error> {
        let timestamp = |v: PrimitiveDateTime| -> Result<MySQLValue> {
            let year = u16::try_from(v.year())
                .map_err(|_| Error::msg(format!("Date {} is out of range for MySQL", v)))?;
            Ok(MySQLValue::Date(
                year,
                v.month().into(),
                v.day(),
                v.hour(),
                v.minute(),
                v.second(),
                v.microsecond(),
            ))
        };
        Ok(match value.0 {
            _ if value.0.is_null() => MySQLValue::NULL,
            Value::Boolean(Some(v)) => MySQLValue::from(v),
            Value::Int32(Some(v)) => MySQLValue::from(v),
            Value::Int64(Some(v)) => MySQLValue::from(v),
            Value::UInt64(Some(v)) => MySQLValue::from(v),
            Value::Float64(Some(v)) => MySQLValue::from(v),
            Value::Varchar(Some(v)) => MySQLValue::from(v),
            Value::Blob(Some(v)) => MySQLValue::Bytes(v.into()),
            Value::Date(Some(v)) => timestamp(v.midnight())?,
            Value::Timestamp(Some(v)) => timestamp(v)?,
            Value::Uuid(Some(v)) => MySQLValue::from(v.hyphenated().to_string()),
            ref v => {
                return Err(Error::msg(format!(
                    "Value `{:?}` is not supported by MySQL",
                    v
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn dates() {
        let value = MySQLValue::try_from(ValueWrap(Value::Date(Some(date!(2025-03-01))))).unwrap();
        assert_eq!(value, MySQLValue::Date(2025, 3, 1, 0, 0, 0, 0));
        let value =
            MySQLValue::try_from(ValueWrap(Value::Timestamp(Some(datetime!(2025-03-01 12:30:45.123)))))
                .unwrap();
        assert_eq!(value, MySQLValue::Date(2025, 3, 1, 12, 30, 45, 123_000));
        let ValueWrap(back) = ValueWrap::try_from(value).unwrap();
        assert_eq!(back, Value::Timestamp(Some(datetime!(2025-03-01 12:30:45.123))));
        assert!(ValueWrap::try_from(MySQLValue::Date(2025, 13, 1, 0, 0, 0, 0)).is_err());
    }

    #[test]
    fn uuids_are_text() {
        let uuid = uuid::uuid!("6ba7b810-9dad-11d1-80b4-00c04fd430c8");
        let value = MySQLValue::try_from(ValueWrap(Value::Uuid(Some(uuid)))).unwrap();
        assert_eq!(
            value,
            MySQLValue::Bytes(b"6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_vec())
        );
    }
}
