//! In memory backend understanding the statements of `GenericSqlWriter`.
#![allow(dead_code)]

use futures::{StreamExt, stream};
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
};
use time::PrimitiveDateTime;
use trophy_core::{
    ACHIEVEMENTS_TABLE, AsValue, Connection, Driver, Error, Executor, GenericSqlWriter, Prepared,
    Query, QueryResult, Result, RowLabeled, RowsAffected, Value, stream::Stream,
};
use uuid::Uuid;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
pub struct MockState {
    pub tables: Mutex<BTreeSet<String>>,
    pub achievements: Mutex<BTreeMap<(Uuid, String), PrimitiveDateTime>>,
    pub counters: Mutex<BTreeMap<(String, Uuid), i64>>,
    /// Number of upcoming queries that fail.
    pub failing_queries: AtomicU32,
    /// Number of upcoming counter writes that are applied and then fail.
    pub failing_after_write: AtomicU32,
    /// Number of upcoming connection attempts that fail.
    pub failing_connects: AtomicU32,
    pub connects: AtomicU32,
    pub queries: AtomicU32,
}

fn consume(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1))
        .is_ok()
}

fn quoted_after<'s>(sql: &'s str, marker: &str) -> Result<&'s str> {
    let start = sql
        .find(marker)
        .map(|i| i + marker.len())
        .ok_or_else(|| Error::msg(format!("Missing `{marker}` in: {sql}")))?;
    let rest = &sql[start..];
    rest.find('"')
        .map(|end| &rest[..end])
        .ok_or_else(|| Error::msg(format!("Unterminated identifier in: {sql}")))
}

fn labeled(names: &[&str], values: Vec<Value>) -> QueryResult {
    RowLabeled::new(
        names.iter().map(|v| v.to_string()).collect(),
        values.into_boxed_slice(),
    )
    .into()
}

impl MockState {
    fn execute(&self, sql: &str, values: Vec<Value>) -> Result<Vec<QueryResult>> {
        self.queries.fetch_add(1, Ordering::AcqRel);
        if consume(&self.failing_queries) {
            return Err(Error::msg("connection reset by peer"));
        }
        let mut values = values.into_iter();
        let mut next = || values.next().ok_or_else(|| Error::msg("Missing parameter"));
        if sql.starts_with("CREATE TABLE") {
            let table = quoted_after(sql, "EXISTS \"")?;
            self.tables.lock().unwrap().insert(table.to_string());
            return Ok(vec![RowsAffected::default().into()]);
        }
        if sql.starts_with("INSERT INTO") {
            let table = quoted_after(sql, "INSERT INTO \"")?;
            let player = Uuid::try_from_value(next()?)?;
            if table.ends_with(ACHIEVEMENTS_TABLE) {
                let name = String::try_from_value(next()?)?;
                let date = PrimitiveDateTime::try_from_value(next()?)?;
                self.achievements
                    .lock()
                    .unwrap()
                    .insert((player, name), date);
            } else {
                let count = i64::try_from_value(next()?)?;
                self.counters
                    .lock()
                    .unwrap()
                    .insert((table.to_string(), player), count);
                if consume(&self.failing_after_write) {
                    return Err(Error::msg("connection lost after commit"));
                }
            }
            return Ok(vec![
                RowsAffected {
                    rows_affected: 1,
                    last_affected_id: None,
                }
                .into(),
            ]);
        }
        if sql.starts_with("SELECT COUNT(*)") {
            let player = Uuid::try_from_value(next()?)?;
            let name = next().ok().map(String::try_from_value).transpose()?;
            let count = self
                .achievements
                .lock()
                .unwrap()
                .keys()
                .filter(|(p, n)| *p == player && name.as_ref().is_none_or(|name| name == n))
                .count();
            return Ok(vec![labeled(&["count"], vec![(count as i64).as_value()])]);
        }
        if sql.starts_with("SELECT") {
            let table = quoted_after(sql, " FROM \"")?;
            let player = Uuid::try_from_value(next()?)?;
            let count = self
                .counters
                .lock()
                .unwrap()
                .get(&(table.to_string(), player))
                .copied();
            return Ok(count
                .map(|v| labeled(&[table], vec![v.as_value()]))
                .into_iter()
                .collect());
        }
        Err(Error::msg(format!("Unsupported statement: {sql}")))
    }
}

#[derive(Default, Clone)]
pub struct MockDriver {
    pub state: Arc<MockState>,
}

impl Driver for MockDriver {
    type Connection = MockConnection;
    type SqlWriter = GenericSqlWriter;
    type Prepared = MockPrepared;

    const NAME: &'static str = "mock";

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }

    fn connect(&self, _url: Cow<'static, str>) -> impl Future<Output = Result<MockConnection>> + Send {
        let driver = self.clone();
        async move {
            if consume(&driver.state.failing_connects) {
                return Err(Error::msg("connection refused"));
            }
            driver.state.connects.fetch_add(1, Ordering::AcqRel);
            Ok(MockConnection { driver })
        }
    }
}

pub struct MockConnection {
    driver: MockDriver,
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn driver(&self) -> &MockDriver {
        &self.driver
    }

    async fn prepare(&mut self, sql: String) -> Result<Query<MockDriver>> {
        Ok(Query::Prepared(MockPrepared {
            sql,
            values: Vec::new(),
        }))
    }

    fn run(&mut self, query: Query<MockDriver>) -> impl Stream<Item = Result<QueryResult>> + Send {
        let state = self.driver.state.clone();
        let (sql, values) = match query {
            Query::Raw(sql) => (sql, Vec::new()),
            Query::Prepared(prepared) => (prepared.sql, prepared.values),
        };
        stream::once(async move {
            tokio::task::yield_now().await;
            state.execute(&sql, values)
        })
        .map(|result| {
            stream::iter(match result {
                Ok(results) => results.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
        })
        .flatten()
    }
}

impl Connection for MockConnection {
    async fn connect(_url: Cow<'static, str>) -> Result<Self> {
        Err(Error::msg("Mock connections are opened through MockDriver"))
    }
}

pub struct MockPrepared {
    sql: String,
    values: Vec<Value>,
}

impl Display for MockPrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl Prepared for MockPrepared {
    fn bind(&mut self, value: impl AsValue) -> Result<&mut Self> {
        self.values.push(value.as_value());
        Ok(self)
    }

    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self> {
        let index = index as usize;
        if self.values.len() <= index {
            self.values.resize(index + 1, Value::Null);
        }
        self.values[index] = value.as_value();
        Ok(self)
    }
}
