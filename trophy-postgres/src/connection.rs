use crate::{PostgresDriver, PostgresPrepared, ValueHolder};
use async_stream::try_stream;
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use std::{borrow::Cow, env, path::Path, pin::pin, sync::Arc};
use tokio::spawn;
use tokio_postgres::{NoTls, Row};
use trophy_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use url::Url;

pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
}

fn row_to_values(row: &Row) -> Result<Box<[trophy_core::Value]>> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let column = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not deserialize column {} `{}`: {}",
                    i,
                    column.name(),
                    column.type_()
                )))
            }
        })
        .collect()
}

impl Executor for PostgresConnection {
    type Driver = PostgresDriver;

    fn driver(&self) -> &Self::Driver {
        &PostgresDriver {}
    }

    async fn prepare(&mut self, sql: String) -> Result<Query<Self::Driver>> {
        let sql = sql.trim_end().trim_end_matches(';').to_string();
        let statement = self.client.prepare(&sql).await.map_err(|e| {
            let e = Error::new(e).context(format!(
                "While preparing the query:\n{}",
                truncate_long!(sql)
            ));
            log::error!("{:#}", e);
            e
        })?;
        Ok(Query::Prepared(PostgresPrepared::new(statement, sql)))
    }

    fn run(&mut self, query: Query<Self::Driver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let context = Arc::new(format!("While running the query:\n{}", query));
        let client = &self.client;
        try_stream! {
            let rows = match query {
                Query::Raw(sql) => {
                    let sql = sql.trim_end().trim_end_matches(';');
                    client.query_raw(sql, Vec::<ValueHolder>::new()).await?
                }
                Query::Prepared(mut prepared) => {
                    let params = prepared.take_params()?;
                    client
                        .query_raw(&prepared.statement, params.into_iter().map(ValueHolder))
                        .await?
                }
            };
            let mut rows = pin!(rows);
            let mut labels: Option<RowNames> = None;
            while let Some(row) = rows.next().await.transpose()? {
                let labels = labels.get_or_insert_with(|| {
                    row.columns().iter().map(|c| c.name().to_string()).collect()
                });
                yield QueryResult::Row(RowLabeled::new(labels.clone(), row_to_values(&row)?));
            }
            if labels.is_none() {
                yield QueryResult::Affected(RowsAffected {
                    rows_affected: rows.rows_affected().unwrap_or_default(),
                    last_affected_id: None,
                });
            }
        }
        .map_err(move |e: Error| {
            let e = e.context(context.clone());
            log::error!("{:#}", e);
            e
        })
    }
}

impl Connection for PostgresConnection {
    async fn connect(url: Cow<'static, str>) -> Result<PostgresConnection> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Postgres connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut url = Url::parse(&url).with_context(context)?;
        // The TLS parameters are handled here, tokio-postgres rejects the ones it does not know
        let mut take_url_param = |key: &str, env_var: &str| {
            let mut pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            let value = pairs
                .iter()
                .position(|(k, _)| k == key)
                .map(|pos| pairs.remove(pos).1);
            if pairs.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
            value.or_else(|| env::var(env_var).ok())
        };
        let sslmode = take_url_param("sslmode", "PGSSLMODE").unwrap_or("disable".into());
        let client = if sslmode == "disable" {
            let (client, connection) = tokio_postgres::connect(url.as_str(), NoTls)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        } else {
            let mut builder = SslConnector::builder(SslMethod::tls())?;
            if let Some(path) = take_url_param("sslrootcert", "PGSSLROOTCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_ca_file(path)?;
            }
            if let Some(path) = take_url_param("sslcert", "PGSSLCERT")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_certificate_chain_file(path)?;
            }
            if let Some(path) = take_url_param("sslkey", "PGSSLKEY")
                .as_deref()
                .map(Path::new)
                && path.exists()
            {
                builder.set_private_key_file(path, SslFiletype::PEM)?;
            }
            match &*sslmode {
                "require" | "prefer" | "allow" => builder.set_verify(SslVerifyMode::NONE),
                _ => builder.set_verify(SslVerifyMode::PEER),
            }
            let mut connector = MakeTlsConnector::new(builder.build());
            if sslmode != "verify-full" {
                connector.set_callback(|config, _| {
                    config.set_verify_hostname(false);
                    Ok(())
                });
            }
            let (client, connection) = tokio_postgres::connect(url.as_str(), connector)
                .await
                .with_context(context)?;
            spawn(async move {
                if let Err(e) = connection.await
                    && !e.is_closed()
                {
                    log::error!("Postgres connection error: {:#}", e);
                }
            });
            client
        };
        Ok(Self { client })
    }
}
