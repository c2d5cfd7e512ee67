use crate::{
    Counter, DatabaseConfig, DatabaseError, Driver, Executor, OperationExecutor, Pool, Result,
    SchemaUpdater, SqlWriter, Stripes,
    stream::{StreamExt, TryStreamExt},
};
use std::{
    collections::HashMap,
    pin::pin,
    sync::{Arc, OnceLock},
};
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// An unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementRecord {
    pub name: String,
    pub awarded: PrimitiveDateTime,
}

struct CounterStatements {
    select: Arc<str>,
    upsert: Arc<str>,
}

/// Persistence façade used by the rest of the plugin.
///
/// Implemented once for every backend, the dialect comes from the [`Driver`].
/// Every method may be called concurrently from many tasks.
pub struct DatabaseManager<D: Driver> {
    executor: OperationExecutor<D>,
    writer: D::SqlWriter,
    prefix: String,
    counters: HashMap<Counter, CounterStatements>,
    stripes: Stripes,
    upsert_achievement: Arc<str>,
    select_achievements: Arc<str>,
    count_achievements: Arc<str>,
    has_achievement: Arc<str>,
}

impl<D: Driver> DatabaseManager<D> {
    /// Validate the configuration, connect and bring the schema up to date.
    pub async fn open(
        driver: D,
        config: &DatabaseConfig,
        schema_updater: impl SchemaUpdater,
    ) -> Result<Self, DatabaseError> {
        config.validate()?;
        let counters = config.counters()?;
        let url = driver
            .connection_url(config)
            .map_err(|e| DatabaseError::configuration(format!("{e:#}")))?;
        driver
            .initialize_storage(config)
            .await
            .map_err(|e| DatabaseError::configuration(format!("{e:#}")))?;
        let writer = driver.sql_writer();
        let pool = Pool::new(driver, url, config.pool_size, config.connection_timeout())?;
        let mut connection = pool.acquire().await?;
        if let Err(e) = schema_updater
            .ensure_schema(&mut *connection, &config.table_prefix, &counters)
            .await
        {
            connection.discard();
            log::error!("Could not update the {} schema: {e:#}", D::NAME);
            return Err(DatabaseError::Schema(e));
        }
        drop(connection);
        log::info!(
            "Using the {} database with {} tracked counters",
            D::NAME,
            counters.len()
        );
        Ok(Self::new(
            OperationExecutor::new(pool, config.retry_policy()),
            writer,
            config.table_prefix.clone(),
            counters,
        ))
    }

    fn new(
        executor: OperationExecutor<D>,
        writer: D::SqlWriter,
        prefix: String,
        counters: Vec<Counter>,
    ) -> Self {
        let counters = counters
            .into_iter()
            .map(|counter| {
                let statements = CounterStatements {
                    select: render(|out| writer.write_select_counter(out, &prefix, &counter)),
                    upsert: render(|out| writer.write_upsert_counter(out, &prefix, &counter)),
                };
                (counter, statements)
            })
            .collect();
        Self {
            upsert_achievement: render(|out| writer.write_upsert_achievement(out, &prefix)),
            select_achievements: render(|out| writer.write_select_player_achievements(out, &prefix)),
            count_achievements: render(|out| writer.write_count_achievements(out, &prefix, false)),
            has_achievement: render(|out| writer.write_count_achievements(out, &prefix, true)),
            executor,
            writer,
            prefix,
            counters,
            stripes: Stripes::default(),
        }
    }

    pub fn pool(&self) -> &Pool<D> {
        self.executor.pool()
    }

    pub fn table_prefix(&self) -> &str {
        &self.prefix
    }

    /// Counters whose tables exist.
    pub fn counters(&self) -> impl Iterator<Item = &Counter> {
        self.counters.keys()
    }

    /// Record that `player` unlocked `name` at `awarded`.
    ///
    /// Unlocking again only refreshes the timestamp. Failures are logged and
    /// otherwise ignored.
    pub async fn register_achievement(&self, player: Uuid, name: &str, awarded: PrimitiveDateTime) {
        let sql = self.upsert_achievement.clone();
        let name = name.to_string();
        let awarded = truncate_to_millis(awarded);
        self.executor
            .write("registering an achievement", move |connection| {
                let sql = sql.to_string();
                let name = name.clone();
                Box::pin(async move {
                    let mut query = connection.prepare(sql).await?;
                    query.bind(player)?.bind(name)?.bind(awarded)?;
                    connection.execute(query).await?;
                    Ok(())
                })
            })
            .await
    }

    /// Add `delta` to the counter of `player` and return the new total.
    ///
    /// A missing row counts as 0. The date of the row becomes today (UTC).
    /// Increments of one (counter, player) pair never interleave.
    pub async fn increment_and_get_counter(
        &self,
        counter: &Counter,
        player: Uuid,
        delta: u32,
    ) -> Result<i64, DatabaseError> {
        let statements = self.counter_statements(counter)?;
        let select = statements.select.clone();
        let upsert = statements.upsert.clone();
        let _guard = self.stripes.lock(&(counter, player)).await;
        // Set once the new total is known, a retry writes it again instead of adding twice.
        let pending = Arc::new(OnceLock::<i64>::new());
        self.executor
            .read(format!("updating the {counter} count"), move |connection| {
                let select = select.to_string();
                let upsert = upsert.to_string();
                let pending = pending.clone();
                Box::pin(async move {
                    let total = match pending.get() {
                        Some(total) => *total,
                        None => {
                            let mut query = connection.prepare(select).await?;
                            query.bind(player)?;
                            let current = connection.fetch_scalar::<i64>(query).await?.unwrap_or(0);
                            *pending.get_or_init(|| current + delta as i64)
                        }
                    };
                    let mut query = connection.prepare(upsert).await?;
                    query.bind(player)?.bind(total)?.bind(today())?;
                    connection.execute(query).await?;
                    Ok(total)
                })
            })
            .await
    }

    /// Increment the `connections` counter, called when a player joins.
    pub async fn increment_and_get_connections(
        &self,
        player: Uuid,
        delta: u32,
    ) -> Result<i64, DatabaseError> {
        self.increment_and_get_counter(&Counter::CONNECTIONS, player, delta)
            .await
    }

    /// Current value of the counter, 0 when the player has none.
    pub async fn counter_value(&self, counter: &Counter, player: Uuid) -> Result<i64, DatabaseError> {
        let select = self.counter_statements(counter)?.select.clone();
        self.executor
            .read(format!("reading the {counter} count"), move |connection| {
                let select = select.to_string();
                Box::pin(async move {
                    let mut query = connection.prepare(select).await?;
                    query.bind(player)?;
                    Ok(connection.fetch_scalar::<i64>(query).await?.unwrap_or(0))
                })
            })
            .await
    }

    /// Achievements of `player`, oldest first.
    pub async fn player_achievements(
        &self,
        player: Uuid,
    ) -> Result<Vec<AchievementRecord>, DatabaseError> {
        let sql = self.select_achievements.clone();
        self.executor
            .read("retrieving the achievements of a player", move |connection| {
                let sql = sql.to_string();
                Box::pin(async move {
                    let mut query = connection.prepare(sql).await?;
                    query.bind(player)?;
                    connection
                        .fetch(query)
                        .map(|row| -> Result<AchievementRecord> {
                            let mut row = row?;
                            Ok(AchievementRecord {
                                name: row.take(0)?,
                                awarded: row.take(1)?,
                            })
                        })
                        .try_collect()
                        .await
                })
            })
            .await
    }

    pub async fn has_player_achievement(&self, player: Uuid, name: &str) -> Result<bool, DatabaseError> {
        let sql = self.has_achievement.clone();
        let name = name.to_string();
        self.executor
            .read("checking the achievement of a player", move |connection| {
                let sql = sql.to_string();
                let name = name.clone();
                Box::pin(async move {
                    let mut query = connection.prepare(sql).await?;
                    query.bind(player)?.bind(name)?;
                    Ok(connection.fetch_scalar::<i64>(query).await?.unwrap_or(0) > 0)
                })
            })
            .await
    }

    pub async fn player_achievement_count(&self, player: Uuid) -> Result<i64, DatabaseError> {
        let sql = self.count_achievements.clone();
        self.executor
            .read("counting the achievements of a player", move |connection| {
                let sql = sql.to_string();
                Box::pin(async move {
                    let mut query = connection.prepare(sql).await?;
                    query.bind(player)?;
                    Ok(connection.fetch_scalar::<i64>(query).await?.unwrap_or(0))
                })
            })
            .await
    }

    /// Players with the most achievements, ties broken by player id.
    pub async fn top_players(&self, limit: u32) -> Result<Vec<(Uuid, i64)>, DatabaseError> {
        let mut sql = String::new();
        self.writer.write_select_top_players(&mut sql, &self.prefix, limit);
        self.executor
            .read("ranking the players", move |connection| {
                let sql = sql.clone();
                Box::pin(async move {
                    let mut rows = pin!(connection.fetch(sql.into()));
                    let mut result = Vec::new();
                    while let Some(row) = rows.next().await {
                        let mut row = row?;
                        result.push((row.take(0)?, row.take(1)?));
                    }
                    Ok(result)
                })
            })
            .await
    }

    /// Close the pool, later operations fail with [`DatabaseError::PoolClosed`].
    pub async fn close(&self) {
        self.executor.pool().close().await;
        log::info!("Closed the {} database", D::NAME);
    }

    fn counter_statements(&self, counter: &Counter) -> Result<&CounterStatements, DatabaseError> {
        self.counters.get(counter).ok_or_else(|| {
            DatabaseError::configuration(format!(
                "the counter `{counter}` is not registered, add it to the configured counters"
            ))
        })
    }
}

fn render(write: impl FnOnce(&mut String)) -> Arc<str> {
    let mut out = String::new();
    write(&mut out);
    out.into()
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Drop the sub millisecond part, the precision every backend stores.
pub fn truncate_to_millis(value: PrimitiveDateTime) -> PrimitiveDateTime {
    value.replace_millisecond(value.millisecond()).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn millis() {
        assert_eq!(
            truncate_to_millis(datetime!(2025-03-01 12:30:45.123456789)),
            datetime!(2025-03-01 12:30:45.123)
        );
        assert_eq!(
            truncate_to_millis(datetime!(2025-03-01 12:30:45)),
            datetime!(2025-03-01 12:30:45)
        );
    }
}
