use crate::{DatabaseError, Driver, Pool, Result};
use futures::future::BoxFuture;
use std::{borrow::Cow, time::Duration};

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. At least 1.
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::ZERO,
        }
    }
}

/// Runs units of SQL work against pooled connections.
///
/// A unit of work is a closure receiving a borrowed connection and returning
/// a boxed future. When the future fails the connection is discarded and the
/// closure is called again with a fresh one, until the [`RetryPolicy`] runs
/// out. The closure may therefore run more than once and must be idempotent.
///
/// ```rust,ignore
/// executor
///     .write("registering an achievement", move |connection| {
///         let sql = sql.clone();
///         Box::pin(async move {
///             let mut query = connection.prepare(sql).await?;
///             query.bind(player)?.bind(name.clone())?.bind(timestamp)?;
///             connection.execute(query).await.map(|_| ())
///         })
///     })
///     .await;
/// ```
pub struct OperationExecutor<D: Driver> {
    pool: Pool<D>,
    policy: RetryPolicy,
}

impl<D: Driver> OperationExecutor<D> {
    pub fn new(pool: Pool<D>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &Pool<D> {
        &self.pool
    }

    /// Run an operation producing a value, failures are returned to the caller.
    pub async fn read<T, F>(
        &self,
        label: impl Into<Cow<'static, str>>,
        operation: F,
    ) -> Result<T, DatabaseError>
    where
        T: Send,
        F: for<'c> FnMut(&'c mut D::Connection) -> BoxFuture<'c, Result<T>> + Send,
    {
        self.run_with_retry(label.into(), operation).await
    }

    /// Run an operation whose failure is only logged.
    pub async fn write<F>(&self, label: impl Into<Cow<'static, str>>, operation: F)
    where
        F: for<'c> FnMut(&'c mut D::Connection) -> BoxFuture<'c, Result<()>> + Send,
    {
        let label = label.into();
        match self.run_with_retry(label.clone(), operation).await {
            Ok(()) | Err(DatabaseError::Transient { .. }) => {}
            Err(e) => log::error!("Dropped the operation {label}: {e}"),
        }
    }

    async fn run_with_retry<T, F>(&self, label: Cow<'static, str>, mut operation: F) -> Result<T, DatabaseError>
    where
        T: Send,
        F: for<'c> FnMut(&'c mut D::Connection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match self.pool.acquire().await {
                Ok(mut connection) => {
                    let result = operation(&mut *connection).await;
                    if result.is_err() {
                        connection.discard();
                    }
                    result
                }
                Err(DatabaseError::Transient { source, .. }) => Err(source),
                Err(e) => return Err(e),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    log::warn!("Error while {label} (attempt {attempt} of {attempts}), retrying: {e:#}");
                    if !self.policy.backoff.is_zero() {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Error while {label}, giving up after {attempt} attempts: {e:#}");
                    return Err(DatabaseError::Transient { label, source: e });
                }
            }
        }
    }
}
