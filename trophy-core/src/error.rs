//! Errors surfaced by the manager façade.
//!
//! Drivers and the plumbing below the operation executor report failures as
//! [`anyhow::Error`] with context attached. The executor and the manager turn
//! them into a [`DatabaseError`], so no backend specific error type ever
//! reaches the plugin.

use std::{borrow::Cow, time::Duration};
use thiserror::Error;

/// Failure taxonomy of the persistence layer.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Unsupported backend, invalid names or unusable connection parameters.
    /// Fatal at startup.
    #[error("invalid database configuration: {0}")]
    Configuration(String),

    /// The schema updater failed. Fatal at startup.
    #[error("could not bring the database schema up to date")]
    Schema(#[source] anyhow::Error),

    /// No connection became available within the acquisition timeout.
    #[error("no database connection available after waiting {0:?}")]
    PoolExhausted(Duration),

    /// The manager was closed.
    #[error("the connection pool is closed")]
    PoolClosed,

    /// The operation kept failing after exhausting the retry budget.
    #[error("error while {label}")]
    Transient {
        label: Cow<'static, str>,
        source: anyhow::Error,
    },
}

impl DatabaseError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DatabaseError::Configuration(message.into())
    }

    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DatabaseError::PoolExhausted(..) | DatabaseError::Transient { .. }
        )
    }
}
