//! Trophy: durable achievement and progress storage for game server plugins.
//!
//! Pick a backend at runtime with [`Database::open`], or use a
//! [`DatabaseManager`] over a specific driver directly.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), trophy::DatabaseError> {
//! use trophy::{Counter, Database, DatabaseConfig};
//! let config = DatabaseConfig::from_toml(r#"
//!     backend = "sqlite"
//!     counters = ["deaths"]
//!     [sqlite]
//!     path = "plugins/trophy/achievements.db"
//! "#)?;
//! let database = Database::open(&config).await?;
//! let player = uuid::Uuid::new_v4();
//! let _joins = database.increment_and_get_connections(player, 1).await?;
//! let _deaths = database
//!     .increment_and_get_counter(&Counter::new("deaths")?, player, 1)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod database;

pub use database::*;
pub use trophy_core::*;
#[cfg(feature = "mysql")]
pub use trophy_mysql as mysql;
#[cfg(feature = "postgres")]
pub use trophy_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use trophy_sqlite as sqlite;
