use crate::{AsValue, Driver, Error, Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A query ready to be executed by an [`Executor`](crate::Executor).
///
/// Represents either raw SQL (`Raw`) or a backend prepared statement
/// (`Prepared`) carrying driver-specific state.
pub enum Query<D: Driver> {
    /// Unprepared SQL text.
    Raw(String),
    /// Driver prepared handle.
    Prepared(D::Prepared),
}

impl<D: Driver> Query<D> {
    /// Append a parameter value.
    pub fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot bind a raw query"));
        };
        prepared.bind(value)?;
        Ok(self)
    }
}

impl<D: Driver> From<String> for Query<D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> Display for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(query) => f.write_str(&truncate_long!(query)),
            Query::Prepared(query) => query.fmt(f),
        }
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    /// Take the value at `index` and convert it, leaving NULL in its place.
    pub fn take<T: AsValue>(&mut self, index: usize) -> Result<T> {
        let value = self.values.get_mut(index).ok_or_else(|| {
            Error::msg(format!(
                "Column {index} does not exist, the row has {} columns",
                self.labels.len()
            ))
        })?;
        T::try_from_value(std::mem::take(value)).map_err(|e| {
            e.context(format!(
                "While decoding column `{}`",
                self.labels.get(index).map(String::as_str).unwrap_or("?")
            ))
        })
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}
