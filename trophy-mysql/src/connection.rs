use crate::{MySQLDriver, MySQLPrepared, RowWrap};
use async_stream::try_stream;
use mysql_async::{Conn, Opts, prelude::Queryable};
use std::{borrow::Cow, sync::Arc};
use trophy_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use url::Url;

pub struct MySQLConnection {
    pub(crate) connection: Conn,
}

impl Executor for MySQLConnection {
    type Driver = MySQLDriver;

    fn driver(&self) -> &Self::Driver {
        &MySQLDriver {}
    }

    async fn prepare(&mut self, query: String) -> Result<Query<Self::Driver>> {
        let statement = self.connection.prep(query.as_str()).await.map_err(|e| {
            let e = Error::new(e).context(format!(
                "While preparing the query:\n{}",
                truncate_long!(query)
            ));
            log::error!("{:#}", e);
            e
        })?;
        Ok(Query::Prepared(MySQLPrepared::new(statement, query)))
    }

    fn run(&mut self, query: Query<Self::Driver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = Arc::new(format!("While running the query:\n{}", query));
        try_stream! {
            match query {
                Query::Raw(sql) => {
                    let mut result = self.connection.query_iter(sql).await?;
                    let mut rows = 0;
                    while let Some(mut stream) = result.stream::<RowWrap>().await? {
                        while let Some(row) = stream.next().await.transpose()? {
                            rows += 1;
                            yield QueryResult::Row(row.0);
                        }
                    }
                    if rows == 0 {
                        yield QueryResult::Affected(RowsAffected {
                            rows_affected: result.affected_rows(),
                            last_affected_id: result.last_insert_id().map(|v| v as _),
                        });
                    }
                }
                Query::Prepared(mut prepared) => {
                    let params = prepared.take_params()?;
                    let mut result = self
                        .connection
                        .exec_iter(prepared.statement, params)
                        .await?;
                    let mut rows = 0;
                    while let Some(mut stream) = result.stream::<RowWrap>().await? {
                        while let Some(row) = stream.next().await.transpose()? {
                            rows += 1;
                            yield QueryResult::Row(row.0);
                        }
                    }
                    if rows == 0 {
                        yield QueryResult::Affected(RowsAffected {
                            rows_affected: result.affected_rows(),
                            last_affected_id: result.last_insert_id().map(|v| v as _),
                        });
                    }
                }
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for MySQLConnection {
    async fn connect(url: Cow<'static, str>) -> Result<MySQLConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "MySQL connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(&url).with_context(context)?;
        let config = Opts::from_url(url.as_str()).with_context(context)?;
        let connection = Conn::new(config).await.with_context(context)?;
        Ok(MySQLConnection { connection })
    }

    async fn disconnect(self) -> Result<()> {
        self.connection
            .disconnect()
            .await
            .context("While disconnecting from MySQL")
    }
}
