use crate::ValueWrap;
use mysql_async::{FromRowError, Value as MySQLValue, prelude::FromRow};
use trophy_core::{Row, RowLabeled, RowNames, Value};

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl FromRow for RowWrap {
    fn from_row_opt(mut row: mysql_async::Row) -> Result<Self, FromRowError>
    where
        Self: Sized,
    {
        let names: RowNames = row
            .columns_ref()
            .iter()
            .map(|v| v.name_str().into_owned())
            .collect();
        let values = (0..row.len())
            .map(|i| match row.take::<MySQLValue, _>(i) {
                Some(value) => ValueWrap::try_from(value).map(Value::from),
                None => Ok(Value::Null),
            })
            .collect::<Result<Row, _>>();
        match values {
            Ok(values) => Ok(RowWrap(RowLabeled::new(names, values))),
            Err(..) => Err(FromRowError(row)),
        }
    }
}
