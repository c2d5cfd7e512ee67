use crate::{SqliteConnection, SqlitePrepared, SqliteSqlWriter};
use trophy_core::{Context, DatabaseConfig, Driver, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;
    type Prepared = SqlitePrepared;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter {}
    }

    /// `sqlite://<path>?mode=rwc`, the file is created when missing.
    fn connection_url(&self, config: &DatabaseConfig) -> Result<String> {
        let path = config.sqlite.path.to_str().with_context(|| {
            format!(
                "The sqlite path `{}` is not valid UTF-8",
                config.sqlite.path.display()
            )
        })?;
        if path.is_empty() {
            return Err(trophy_core::Error::msg("The sqlite path is empty"));
        }
        Ok(format!("{}://{}?mode=rwc", Self::NAME, path))
    }

    /// Create the directories containing the database file.
    async fn initialize_storage(&self, config: &DatabaseConfig) -> Result<()> {
        let Some(parent) = config.sqlite.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Could not create the directory `{}`", parent.display()))
    }
}
