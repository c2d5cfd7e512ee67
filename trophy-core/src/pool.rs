use crate::{Connection, DatabaseError, Driver, Error};
use deadpool::{
    Runtime,
    managed::{self, Metrics, Object, PoolError, RecycleResult, TimeoutType},
};
use std::{
    borrow::Cow,
    fmt::{self, Debug},
    ops::{Deref, DerefMut},
    time::Duration,
};

/// Opens connections for the pool through the [`Driver`].
pub struct ConnectionManager<D: Driver> {
    driver: D,
    url: Cow<'static, str>,
}

impl<D: Driver> managed::Manager for ConnectionManager<D> {
    type Type = D::Connection;
    type Error = Error;

    async fn create(&self) -> Result<D::Connection, Error> {
        let connection = self.driver.connect(self.url.clone()).await?;
        log::debug!("Opened a {} connection", D::NAME);
        Ok(connection)
    }

    async fn recycle(&self, _: &mut D::Connection, _: &Metrics) -> RecycleResult<Error> {
        Ok(())
    }
}

/// Bounded set of connections to one database.
///
/// Connections are opened lazily, at most `size` of them exist at any time.
/// Broken connections are taken out of the pool instead of being recycled.
pub struct Pool<D: Driver> {
    pool: managed::Pool<ConnectionManager<D>>,
    timeout: Duration,
}

impl<D: Driver> Pool<D> {
    pub fn new(
        driver: D,
        url: impl Into<Cow<'static, str>>,
        size: u32,
        timeout: Duration,
    ) -> Result<Self, DatabaseError> {
        let manager = ConnectionManager {
            driver,
            url: url.into(),
        };
        let pool = managed::Pool::builder(manager)
            .max_size(size as usize)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| DatabaseError::configuration(format!("Could not build the pool: {e}")))?;
        Ok(Self { pool, timeout })
    }

    pub fn driver(&self) -> &D {
        &self.pool.manager().driver
    }

    /// Maximum number of connections.
    pub fn size(&self) -> u32 {
        self.pool.status().max_size as u32
    }

    /// Connections currently established, idle or borrowed.
    pub fn open_connections(&self) -> u32 {
        self.pool.status().size as u32
    }

    pub fn idle_connections(&self) -> usize {
        self.pool.status().available
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Borrow a connection, opening a new one if no idle connection is left.
    ///
    /// Waits at most the pool timeout for a free slot, then fails with
    /// [`DatabaseError::PoolExhausted`]. A failure to open a connection is
    /// reported as [`DatabaseError::Transient`].
    pub async fn acquire(&self) -> Result<PooledConnection<D>, DatabaseError> {
        let transient = |source| DatabaseError::Transient {
            label: "connecting to the database".into(),
            source,
        };
        match self.pool.get().await {
            Ok(object) => Ok(PooledConnection { object }),
            Err(PoolError::Closed) => Err(DatabaseError::PoolClosed),
            Err(PoolError::Timeout(TimeoutType::Wait)) => {
                let status = self.pool.status();
                log::warn!(
                    "All the {} {} connections were busy for {:?}",
                    status.max_size,
                    D::NAME,
                    self.timeout
                );
                Err(DatabaseError::PoolExhausted(self.timeout))
            }
            Err(PoolError::Timeout(..)) => Err(transient(Error::msg(format!(
                "Could not connect to {} within {:?}",
                D::NAME,
                self.timeout
            )))),
            Err(PoolError::Backend(e)) => Err(transient(e)),
            Err(e) => Err(transient(Error::msg(e.to_string()))),
        }
    }

    /// Reject new acquisitions and disconnect the idle connections.
    ///
    /// Borrowed connections are dropped when they are returned.
    pub async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        let idle = self.pool.retain(|_, _| false).removed;
        self.pool.close();
        log::debug!("Closing the {} pool, {} idle connections", D::NAME, idle.len());
        for connection in idle {
            if let Err(e) = connection.disconnect().await {
                log::warn!("Error while disconnecting from {}: {e:#}", D::NAME);
            }
        }
    }
}

impl<D: Driver> Debug for Pool<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.pool.status();
        f.debug_struct("Pool")
            .field("driver", &D::NAME)
            .field("size", &status.max_size)
            .field("open", &status.size)
            .field("idle", &status.available)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A connection borrowed from a [`Pool`], given back when dropped.
pub struct PooledConnection<D: Driver> {
    object: Object<ConnectionManager<D>>,
}

impl<D: Driver> PooledConnection<D> {
    /// Close the connection instead of returning it to the pool.
    pub fn discard(self) {
        drop(Object::take(self.object));
        log::debug!("Discarded a broken {} connection", D::NAME);
    }
}

impl<D: Driver> Deref for PooledConnection<D> {
    type Target = D::Connection;

    fn deref(&self) -> &Self::Target {
        &self.object
    }
}

impl<D: Driver> DerefMut for PooledConnection<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.object
    }
}
