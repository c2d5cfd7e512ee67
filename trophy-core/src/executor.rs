use crate::{
    AsValue, Driver, Query, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::{future::Future, pin::pin};

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    fn prepare(&mut self, query: String) -> impl Future<Output = Result<Query<Self::Driver>>> + Send;

    /// General method to send any query and return any result type (either row or count)
    fn run(&mut self, query: Query<Self::Driver>) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the query and returns the rows.
    fn fetch(&mut self, query: Query<Self::Driver>) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the query and return the total number of rows affected.
    fn execute(&mut self, query: Query<Self::Driver>) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// First column of the first row, `None` when the query returns no rows.
    fn fetch_scalar<T: AsValue + Send>(
        &mut self,
        query: Query<Self::Driver>,
    ) -> impl Future<Output = Result<Option<T>>> + Send {
        async move {
            let mut rows = pin!(self.fetch(query));
            match rows.next().await {
                Some(row) => Ok(Some(row?.take(0)?)),
                None => Ok(None),
            }
        }
    }
}
