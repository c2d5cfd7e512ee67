use crate::{
    CBox, SqliteDriver, SqlitePrepared, error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_FULLMUTEX, SQLITE_OPEN_READWRITE,
    SQLITE_OPEN_URI, SQLITE_ROW, sqlite3, sqlite3_busy_timeout, sqlite3_changes, sqlite3_close,
    sqlite3_column_count, sqlite3_db_handle, sqlite3_errmsg, sqlite3_exec, sqlite3_finalize,
    sqlite3_last_insert_rowid, sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt,
};
use std::{
    borrow::Cow,
    ffi::{CStr, CString, c_int},
    ptr,
};
use trophy_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, RowLabeled,
    RowNames, RowsAffected, stream::Stream, truncate_long,
};
use tokio::task::spawn_blocking;

/// Milliseconds a statement waits for a lock held by another connection.
const BUSY_TIMEOUT_MS: c_int = 5_000;

#[derive(Debug)]
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteConnection {
    /// Non owning copy of the handle, to move into blocking tasks.
    fn handle(&self) -> CBox<*mut sqlite3> {
        CBox::new(*self.connection, |_| {})
    }

    fn prepare_statement(
        connection: CBox<*mut sqlite3>,
        query: String,
    ) -> Result<CBox<*mut sqlite3_stmt>> {
        let context = || format!("While preparing the query:\n{}", truncate_long!(query));
        let sql = match CString::new(query.as_bytes()) {
            Ok(sql) => sql,
            Err(e) => {
                let error = Error::new(e)
                    .context("Could not create a CString from the query String")
                    .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
        };
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        unsafe {
            let mut tail = ptr::null();
            let rc = sqlite3_prepare_v2(
                *connection,
                sql.as_ptr(),
                sql.as_bytes().len() as c_int,
                &mut *statement,
                &mut tail,
            );
            if rc != SQLITE_OK {
                let error =
                    Error::msg(error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string())
                        .context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
            if !tail.is_null() && !CStr::from_ptr(tail).to_bytes().trim_ascii().is_empty() {
                let error =
                    Error::msg("Cannot prepare more than one statement at a time").context(context());
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        Ok(statement)
    }

    /// Step the statement to completion, collecting every row.
    fn run_statement(statement: CBox<*mut sqlite3_stmt>) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        unsafe {
            let count = sqlite3_column_count(*statement);
            let labels = (0..count)
                .map(|i| extract_name(*statement, i))
                .collect::<Result<RowNames>>()?;
            loop {
                match sqlite3_step(*statement) {
                    SQLITE_ROW => {
                        let values = (0..count)
                            .map(|i| extract_value(*statement, i))
                            .collect::<Result<_>>()?;
                        results.push(RowLabeled::new(labels.clone(), values).into());
                    }
                    SQLITE_DONE => break,
                    _ => {
                        let error = Error::msg(
                            error_message_from_ptr(&sqlite3_errmsg(sqlite3_db_handle(*statement)))
                                .to_string(),
                        );
                        log::error!("{:#}", error);
                        return Err(error);
                    }
                }
            }
            if count == 0 {
                let db = sqlite3_db_handle(*statement);
                results.push(
                    RowsAffected {
                        rows_affected: sqlite3_changes(db).max(0) as u64,
                        last_affected_id: Some(sqlite3_last_insert_rowid(db)),
                    }
                    .into(),
                );
            }
        }
        Ok(results)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    async fn prepare(&mut self, query: String) -> Result<Query<SqliteDriver>> {
        let connection = self.handle();
        let statement =
            spawn_blocking(move || Self::prepare_statement(connection, query)).await??;
        Ok(Query::Prepared(SqlitePrepared::new(statement)))
    }

    fn run(&mut self, query: Query<SqliteDriver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = self.handle();
        try_stream! {
            let results = spawn_blocking(move || {
                let statement = match query {
                    Query::Raw(sql) => Self::prepare_statement(connection, sql)?,
                    Query::Prepared(prepared) => prepared.statement,
                };
                Self::run_statement(statement)
            })
            .await??;
            for result in results {
                yield result;
            }
        }
    }
}

impl Connection for SqliteConnection {
    /// Accepts `sqlite://<path>[?<uri parameters>]`, for example
    /// `sqlite://plugins/achievements.db?mode=rwc`.
    async fn connect(url: Cow<'static, str>) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let (path, parameters) = location.split_once('?').unwrap_or((location, ""));
        let mut uri = String::from("file:");
        for c in path.chars() {
            match c {
                '%' => uri.push_str("%25"),
                '?' => uri.push_str("%3f"),
                '#' => uri.push_str("%23"),
                c => uri.push(c),
            }
        }
        if !parameters.is_empty() {
            uri.push('?');
            uri.push_str(parameters);
        }
        let context = || format!("While opening the sqlite database `{}`", url);
        let uri = CString::new(uri).with_context(context)?;
        let connection = spawn_blocking(move || unsafe {
            let mut connection = CBox::new(ptr::null_mut(), |p| {
                sqlite3_close(p);
            });
            let rc = sqlite3_open_v2(
                uri.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_URI | SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_FULLMUTEX,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    "Out of memory".to_string()
                } else {
                    let errmsg = sqlite3_errmsg(*connection);
                    error_message_from_ptr(&errmsg).to_string()
                };
                return Err(Error::msg(message));
            }
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT_MS);
            let rc = sqlite3_exec(
                *connection,
                c"PRAGMA journal_mode=WAL;".as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if rc != SQLITE_OK {
                let errmsg = sqlite3_errmsg(*connection);
                log::debug!(
                    "Could not enable the write ahead log: {}",
                    error_message_from_ptr(&errmsg)
                );
            }
            Ok(connection)
        })
        .await?
        .with_context(context);
        match connection {
            Ok(connection) => Ok(Self { connection }),
            Err(error) => {
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }
}
