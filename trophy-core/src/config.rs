use crate::{Counter, DatabaseError, RetryPolicy, is_identifier_safe};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

/// Backend families a configuration can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
    MySql,
}

impl FromStr for Backend {
    type Err = DatabaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "mysql" | "mariadb" => Ok(Backend::MySql),
            _ => Err(DatabaseError::configuration(format!(
                "unsupported database backend `{value}`, expected one of sqlite, postgresql, mysql"
            ))),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Sqlite => "sqlite",
            Backend::Postgres => "postgres",
            Backend::MySql => "mysql",
        })
    }
}

/// Everything the persistence layer reads from the plugin configuration.
///
/// Read once when the manager is opened. Unspecified keys take the defaults
/// of [`DatabaseConfig::default`].
///
/// ```toml
/// backend = "postgresql"
/// table_prefix = "aa_"
/// pool_size = 8
///
/// [remote]
/// host = "db.internal"
/// user = "minecraft"
/// password = "secret"
/// database = "achievements"
/// options = { sslmode = "require" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub backend: String,
    pub table_prefix: String,
    pub pool_size: u32,
    pub connection_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Counters whose tables are created at startup, besides `connections`.
    pub counters: Vec<String>,
    pub sqlite: SqliteConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub host: String,
    /// Driver default port when missing.
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Extra connection URL query parameters, passed through to the driver.
    pub options: BTreeMap<String, String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".into(),
            table_prefix: String::new(),
            pool_size: 4,
            connection_timeout_ms: 5_000,
            retry_attempts: 2,
            retry_backoff_ms: 0,
            counters: Vec::new(),
            sqlite: Default::default(),
            remote: Default::default(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "achievements.db".into(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: None,
            user: String::new(),
            password: String::new(),
            database: "achievements".into(),
            options: BTreeMap::new(),
        }
    }
}

impl DatabaseConfig {
    pub fn from_toml(text: &str) -> Result<Self, DatabaseError> {
        toml::from_str(text).map_err(|e| DatabaseError::configuration(e.to_string()))
    }

    pub fn backend(&self) -> Result<Backend, DatabaseError> {
        self.backend.parse()
    }

    /// Reject values that would make the manager unusable.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        self.backend()?;
        if !is_identifier_safe(&self.table_prefix) {
            return Err(DatabaseError::configuration(format!(
                "table prefix `{}` may only contain ASCII letters, digits or underscores",
                self.table_prefix
            )));
        }
        if self.pool_size == 0 {
            return Err(DatabaseError::configuration("pool_size must be at least 1"));
        }
        if self.retry_attempts == 0 {
            return Err(DatabaseError::configuration(
                "retry_attempts must be at least 1",
            ));
        }
        self.counters()?;
        Ok(())
    }

    /// Every counter tracked by the manager, `connections` first, deduplicated.
    pub fn counters(&self) -> Result<Vec<Counter>, DatabaseError> {
        let mut counters = vec![Counter::CONNECTIONS];
        for name in &self.counters {
            let counter = Counter::new(name.clone())?;
            if !counters.contains(&counter) {
                counters.push(counter);
            }
        }
        Ok(counters)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn defaults() {
        let config = DatabaseConfig::from_toml("").unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.backend().unwrap(), Backend::Sqlite);
        assert_eq!(config.connection_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry_policy().attempts, 2);
        assert_eq!(config.counters().unwrap(), vec![Counter::CONNECTIONS]);
        config.validate().unwrap();
    }

    #[test]
    fn remote() {
        let config = DatabaseConfig::from_toml(indoc! {r#"
            backend = "PostgreSQL"
            table_prefix = "aa_"
            pool_size = 8
            counters = ["deaths", "connections", "deaths"]

            [remote]
            host = "db.internal"
            port = 5433
            user = "minecraft"
            password = "p@ss word"
            options = { sslmode = "require" }
        "#})
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.backend().unwrap(), Backend::Postgres);
        assert_eq!(config.remote.port, Some(5433));
        assert_eq!(config.remote.database, "achievements");
        assert_eq!(config.remote.options["sslmode"], "require");
        assert_eq!(
            config.counters().unwrap(),
            vec![Counter::CONNECTIONS, Counter::new("deaths").unwrap()]
        );
    }

    #[test]
    fn rejected() {
        let unsupported = DatabaseConfig {
            backend: "h2".into(),
            ..Default::default()
        };
        assert!(matches!(
            unsupported.validate(),
            Err(DatabaseError::Configuration(..))
        ));
        let prefix = DatabaseConfig {
            table_prefix: "aa-".into(),
            ..Default::default()
        };
        assert!(prefix.validate().is_err());
        let pool = DatabaseConfig {
            pool_size: 0,
            ..Default::default()
        };
        assert!(pool.validate().is_err());
        assert!(DatabaseConfig::from_toml("pool_size = \"many\"").is_err());
        assert!(DatabaseConfig::from_toml("unknown_key = 1").is_err());
        assert_eq!(
            "MariaDB".parse::<Backend>().unwrap(),
            Backend::MySql
        );
    }
}
