mod mock;

use mock::{MockDriver, init_logs};
use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use time::macros::datetime;
use trophy_core::{
    Counter, DatabaseConfig, DatabaseError, DatabaseManager, SchemaUpdater, TableSchemaUpdater,
};
use uuid::Uuid;

fn config() -> DatabaseConfig {
    DatabaseConfig {
        table_prefix: "aa_".into(),
        pool_size: 2,
        connection_timeout_ms: 50,
        counters: vec!["deaths".into()],
        ..Default::default()
    }
}

async fn open(config: &DatabaseConfig) -> (DatabaseManager<MockDriver>, MockDriver) {
    let driver = MockDriver::default();
    let manager = DatabaseManager::open(driver.clone(), config, TableSchemaUpdater::new())
        .await
        .unwrap();
    (manager, driver)
}

#[tokio::test]
async fn schema_is_created() {
    init_logs();
    let (manager, driver) = open(&config()).await;
    assert_eq!(
        driver
            .state
            .tables
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .collect::<Vec<_>>(),
        ["aa_achievements", "aa_connections", "aa_deaths"]
    );
    assert_eq!(manager.table_prefix(), "aa_");
    assert_eq!(manager.counters().count(), 2);
}

#[tokio::test]
async fn invalid_configuration() {
    init_logs();
    let config = DatabaseConfig {
        backend: "oracle".into(),
        ..config()
    };
    let result = DatabaseManager::open(MockDriver::default(), &config, TableSchemaUpdater::new()).await;
    assert!(matches!(result, Err(DatabaseError::Configuration(..))));
}

#[tokio::test]
async fn schema_failure_is_fatal() {
    init_logs();
    let driver = MockDriver::default();
    driver.state.failing_queries.store(1, Ordering::Release);
    let result = DatabaseManager::open(driver.clone(), &config(), TableSchemaUpdater::new()).await;
    assert!(matches!(result, Err(DatabaseError::Schema(..))));
}

#[tokio::test]
async fn retry_masks_one_failure() {
    init_logs();
    let (manager, driver) = open(&config()).await;
    let player = Uuid::new_v4();
    driver.state.failing_queries.store(1, Ordering::Release);
    manager
        .register_achievement(player, "First Join", datetime!(2025-01-01 10:00:00.250999))
        .await;
    assert_eq!(
        driver
            .state
            .achievements
            .lock()
            .unwrap()
            .get(&(player, "First Join".into()))
            .copied(),
        Some(datetime!(2025-01-01 10:00:00.250))
    );
    // The failed connection was replaced
    assert_eq!(driver.state.connects.load(Ordering::Acquire), 2);
    assert_eq!(manager.pool().open_connections(), 1);
}

#[tokio::test]
async fn exhausted_retries() {
    init_logs();
    let (manager, driver) = open(&config()).await;
    let player = Uuid::new_v4();
    let before = driver.state.queries.load(Ordering::Acquire);
    driver.state.failing_queries.store(10, Ordering::Release);
    let result = manager.increment_and_get_connections(player, 1).await;
    let Err(DatabaseError::Transient { label, source }) = result else {
        panic!("Expected a transient error");
    };
    assert_eq!(label, "updating the connections count");
    assert_eq!(source.to_string(), "connection reset by peer");
    assert_eq!(driver.state.queries.load(Ordering::Acquire) - before, 2);
    // Writes only log the failure
    manager
        .register_achievement(player, "First Join", datetime!(2025-01-01 10:00))
        .await;
    assert!(driver.state.achievements.lock().unwrap().is_empty());
    driver.state.failing_queries.store(0, Ordering::Release);
    assert_eq!(manager.increment_and_get_connections(player, 1).await.unwrap(), 1);
}

#[tokio::test]
async fn retried_increment_counts_once() {
    init_logs();
    let (manager, driver) = open(&config()).await;
    let player = Uuid::new_v4();
    driver.state.failing_after_write.store(1, Ordering::Release);
    assert_eq!(manager.increment_and_get_connections(player, 1).await.unwrap(), 1);
    assert_eq!(
        driver
            .state
            .counters
            .lock()
            .unwrap()
            .values()
            .copied()
            .collect::<Vec<_>>(),
        [1]
    );
    assert_eq!(driver.state.connects.load(Ordering::Acquire), 2);
    assert_eq!(manager.increment_and_get_connections(player, 2).await.unwrap(), 3);
}

#[tokio::test]
async fn exhaustion_is_not_retried() {
    init_logs();
    let config = DatabaseConfig {
        pool_size: 1,
        ..config()
    };
    let (manager, driver) = open(&config).await;
    let held = manager.pool().acquire().await.unwrap();
    let before = driver.state.queries.load(Ordering::Acquire);
    let result = manager.counter_value(&Counter::CONNECTIONS, Uuid::new_v4()).await;
    assert!(matches!(result, Err(DatabaseError::PoolExhausted(..))));
    assert_eq!(driver.state.queries.load(Ordering::Acquire), before);
    drop(held);
    assert_eq!(
        manager
            .counter_value(&Counter::CONNECTIONS, Uuid::new_v4())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn no_lost_updates() {
    init_logs();
    let config = DatabaseConfig {
        pool_size: 4,
        connection_timeout_ms: 5_000,
        ..config()
    };
    let (manager, _driver) = open(&config).await;
    let manager = Arc::new(manager);
    let deaths = Counter::new("deaths").unwrap();
    let player = Uuid::new_v4();
    assert_eq!(manager.increment_and_get_counter(&deaths, player, 5).await.unwrap(), 5);
    let tasks = (0..32)
        .map(|_| {
            let manager = manager.clone();
            let deaths = deaths.clone();
            tokio::spawn(async move { manager.increment_and_get_counter(&deaths, player, 1).await })
        })
        .collect::<Vec<_>>();
    let mut totals = Vec::new();
    for task in tasks {
        totals.push(task.await.unwrap().unwrap());
    }
    totals.sort();
    assert_eq!(totals, (6..=37).collect::<Vec<_>>());
    assert_eq!(manager.counter_value(&deaths, player).await.unwrap(), 37);
    assert!(manager.pool().open_connections() <= 4);
}

#[tokio::test]
async fn unregistered_counter() {
    init_logs();
    let (manager, _driver) = open(&config()).await;
    let kills = Counter::new("kills").unwrap();
    assert!(matches!(
        manager.increment_and_get_counter(&kills, Uuid::new_v4(), 1).await,
        Err(DatabaseError::Configuration(..))
    ));
}

#[tokio::test]
async fn closed() {
    init_logs();
    let (manager, _driver) = open(&config()).await;
    manager.close().await;
    assert!(matches!(
        manager.player_achievement_count(Uuid::new_v4()).await,
        Err(DatabaseError::PoolClosed)
    ));
    manager
        .register_achievement(Uuid::new_v4(), "Late", datetime!(2025-01-01 10:00))
        .await;
}

#[tokio::test(start_paused = true)]
async fn backoff_waits() {
    init_logs();
    let config = DatabaseConfig {
        retry_attempts: 3,
        retry_backoff_ms: 1_000,
        connection_timeout_ms: 60_000,
        ..config()
    };
    let (manager, driver) = open(&config).await;
    driver.state.failing_queries.store(2, Ordering::Release);
    let start = tokio::time::Instant::now();
    assert!(manager.has_player_achievement(Uuid::new_v4(), "x").await.is_ok());
    assert!(start.elapsed() >= Duration::from_secs(2));
}

struct FailingUpdater;

impl SchemaUpdater for FailingUpdater {
    async fn ensure_schema<C: trophy_core::Connection>(
        &self,
        _connection: &mut C,
        _prefix: &str,
        _counters: &[Counter],
    ) -> trophy_core::Result<()> {
        Err(trophy_core::Error::msg("missing migration"))
    }
}

#[tokio::test]
async fn custom_schema_updater() {
    init_logs();
    let result = DatabaseManager::open(MockDriver::default(), &config(), FailingUpdater).await;
    let Err(DatabaseError::Schema(e)) = result else {
        panic!("Expected a schema error");
    };
    assert_eq!(e.to_string(), "missing migration");
}
