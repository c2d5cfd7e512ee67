use std::fmt::{self, Debug};
use time::PrimitiveDateTime;
use trophy_core::{
    AchievementRecord, Backend, Counter, DatabaseConfig, DatabaseError, DatabaseManager,
    SchemaUpdater, TableSchemaUpdater,
};
#[cfg(feature = "mysql")]
use trophy_mysql::MySQLDriver;
#[cfg(feature = "postgres")]
use trophy_postgres::PostgresDriver;
#[cfg(feature = "sqlite")]
use trophy_sqlite::SqliteDriver;
use uuid::Uuid;

/// A [`DatabaseManager`] over the backend chosen by the configuration.
pub enum Database {
    #[cfg(feature = "sqlite")]
    Sqlite(DatabaseManager<SqliteDriver>),
    #[cfg(feature = "postgres")]
    Postgres(DatabaseManager<PostgresDriver>),
    #[cfg(feature = "mysql")]
    MySql(DatabaseManager<MySQLDriver>),
}

macro_rules! dispatch {
    ($self:ident, $manager:ident => $body:expr) => {
        match $self {
            #[cfg(feature = "sqlite")]
            Database::Sqlite($manager) => $body,
            #[cfg(feature = "postgres")]
            Database::Postgres($manager) => $body,
            #[cfg(feature = "mysql")]
            Database::MySql($manager) => $body,
        }
    };
}

impl Database {
    /// Open the backend named by `config.backend`, creating the missing tables.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        Self::open_with(config, TableSchemaUpdater::new()).await
    }

    /// Open the backend named by `config.backend` running a custom schema updater.
    ///
    /// Fails with [`DatabaseError::Configuration`] when the backend is
    /// unknown or was left out of this build.
    pub async fn open_with(
        config: &DatabaseConfig,
        schema_updater: impl SchemaUpdater,
    ) -> Result<Self, DatabaseError> {
        let backend = config.backend()?;
        log::debug!("Opening the {backend} backend");
        let database = match backend {
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Database::Sqlite(
                DatabaseManager::open(SqliteDriver::new(), config, schema_updater).await?,
            ),
            #[cfg(feature = "postgres")]
            Backend::Postgres => Database::Postgres(
                DatabaseManager::open(PostgresDriver::new(), config, schema_updater).await?,
            ),
            #[cfg(feature = "mysql")]
            Backend::MySql => Database::MySql(
                DatabaseManager::open(MySQLDriver::new(), config, schema_updater).await?,
            ),
            #[allow(unreachable_patterns)]
            backend => {
                return Err(DatabaseError::configuration(format!(
                    "the {backend} backend is not enabled in this build"
                )));
            }
        };
        Ok(database)
    }

    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "sqlite")]
            Database::Sqlite(..) => Backend::Sqlite,
            #[cfg(feature = "postgres")]
            Database::Postgres(..) => Backend::Postgres,
            #[cfg(feature = "mysql")]
            Database::MySql(..) => Backend::MySql,
        }
    }

    pub fn table_prefix(&self) -> &str {
        dispatch!(self, manager => manager.table_prefix())
    }

    /// See [`DatabaseManager::register_achievement`].
    pub async fn register_achievement(&self, player: Uuid, name: &str, awarded: PrimitiveDateTime) {
        dispatch!(self, manager => manager.register_achievement(player, name, awarded).await)
    }

    /// See [`DatabaseManager::increment_and_get_counter`].
    pub async fn increment_and_get_counter(
        &self,
        counter: &Counter,
        player: Uuid,
        delta: u32,
    ) -> Result<i64, DatabaseError> {
        dispatch!(self, manager => manager.increment_and_get_counter(counter, player, delta).await)
    }

    pub async fn increment_and_get_connections(
        &self,
        player: Uuid,
        delta: u32,
    ) -> Result<i64, DatabaseError> {
        dispatch!(self, manager => manager.increment_and_get_connections(player, delta).await)
    }

    pub async fn counter_value(&self, counter: &Counter, player: Uuid) -> Result<i64, DatabaseError> {
        dispatch!(self, manager => manager.counter_value(counter, player).await)
    }

    pub async fn player_achievements(
        &self,
        player: Uuid,
    ) -> Result<Vec<AchievementRecord>, DatabaseError> {
        dispatch!(self, manager => manager.player_achievements(player).await)
    }

    pub async fn has_player_achievement(&self, player: Uuid, name: &str) -> Result<bool, DatabaseError> {
        dispatch!(self, manager => manager.has_player_achievement(player, name).await)
    }

    pub async fn player_achievement_count(&self, player: Uuid) -> Result<i64, DatabaseError> {
        dispatch!(self, manager => manager.player_achievement_count(player).await)
    }

    pub async fn top_players(&self, limit: u32) -> Result<Vec<(Uuid, i64)>, DatabaseError> {
        dispatch!(self, manager => manager.top_players(limit).await)
    }

    pub async fn close(&self) {
        dispatch!(self, manager => manager.close().await)
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, manager => f
            .debug_struct("Database")
            .field("backend", &self.backend())
            .field("table_prefix", &manager.table_prefix())
            .field("pool", manager.pool())
            .finish())
    }
}
