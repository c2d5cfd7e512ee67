mod achievements;
mod counters;
mod pool;
mod ranking;
mod scenario;
mod snapshot;

pub use snapshot::{Snapshot, canonical_snapshot, replay};

use log::LevelFilter;
use std::env;
use trophy_core::{DatabaseConfig, DatabaseManager, Driver, TableSchemaUpdater};
use uuid::Uuid;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Counter tracked by the suite besides `connections`.
pub const DEATHS: &str = "deaths";

/// Copy of `config` writing to fresh tables, so runs never see each other's rows.
pub fn isolated_config(config: &DatabaseConfig) -> DatabaseConfig {
    let mut config = config.clone();
    config.table_prefix = format!("t{}_", &Uuid::new_v4().simple().to_string()[..8]);
    if !config.counters.iter().any(|v| v == DEATHS) {
        config.counters.push(DEATHS.into());
    }
    config
}

pub async fn open<D: Driver>(driver: D, config: &DatabaseConfig) -> DatabaseManager<D> {
    DatabaseManager::open(driver, config, TableSchemaUpdater::new())
        .await
        .unwrap_or_else(|e| panic!("Could not open the {} database: {e:#}", D::NAME))
}

/// Run every behavioural test against the database described by `config`.
pub async fn execute_tests<D: Driver + Clone>(driver: D, config: DatabaseConfig) {
    let config = isolated_config(&config);
    let manager = open(driver.clone(), &config).await;
    // The schema updater is idempotent
    let manager = {
        manager.close().await;
        open(driver.clone(), &config).await
    };
    scenario::scenario(&manager).await;
    achievements::achievements(&manager).await;
    counters::counters(&manager).await;
    counters::concurrent_increments(&manager).await;
    manager.close().await;

    ranking::ranking(open(driver.clone(), &isolated_config(&config)).await).await;
    pool::exhaustion(driver.clone(), &isolated_config(&config)).await;

    let manager = open(driver, &isolated_config(&config)).await;
    assert_eq!(replay(&manager).await, canonical_snapshot());
    manager.close().await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
