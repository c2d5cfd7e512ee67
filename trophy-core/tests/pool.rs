mod mock;

use mock::{MockDriver, init_logs};
use std::{sync::atomic::Ordering, time::Duration};
use trophy_core::{DatabaseError, Pool};

fn pool(size: u32) -> (Pool<MockDriver>, MockDriver) {
    let driver = MockDriver::default();
    let pool = Pool::new(
        driver.clone(),
        "mock://localhost/achievements",
        size,
        Duration::from_millis(50),
    )
    .unwrap();
    (pool, driver)
}

#[tokio::test]
async fn lazy_connections_are_reused() {
    init_logs();
    let (pool, driver) = pool(3);
    assert_eq!(pool.open_connections(), 0);
    for _ in 0..5 {
        let _connection = pool.acquire().await.unwrap();
        assert_eq!(pool.idle_connections(), 0);
    }
    assert_eq!(driver.state.connects.load(Ordering::Acquire), 1);
    assert_eq!(pool.open_connections(), 1);
    assert_eq!(pool.idle_connections(), 1);
}

#[tokio::test]
async fn exhaustion_is_transient() {
    init_logs();
    let (pool, _driver) = pool(2);
    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();
    let result = pool.acquire().await;
    assert!(matches!(result, Err(DatabaseError::PoolExhausted(..))));
    assert!(result.err().is_some_and(|e| e.is_transient()));
    assert_eq!(pool.open_connections(), 2);
    drop(first);
    let third = pool.acquire().await.unwrap();
    assert!(pool.open_connections() <= pool.size());
    drop(second);
    drop(third);
    assert_eq!(pool.idle_connections(), 2);
}

#[tokio::test]
async fn waiting_acquire_gets_released_connection() {
    init_logs();
    let (pool, _driver) = pool(1);
    let connection = pool.acquire().await.unwrap();
    let (acquired, ()) = tokio::join!(pool.acquire(), async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(connection);
    });
    assert!(acquired.is_ok());
}

#[tokio::test]
async fn broken_connections_are_discarded() {
    init_logs();
    let (pool, driver) = pool(2);
    let connection = pool.acquire().await.unwrap();
    connection.discard();
    assert_eq!(pool.open_connections(), 0);
    assert_eq!(pool.idle_connections(), 0);
    let _connection = pool.acquire().await.unwrap();
    assert_eq!(driver.state.connects.load(Ordering::Acquire), 2);
}

#[tokio::test]
async fn connect_failure() {
    init_logs();
    let (pool, driver) = pool(1);
    driver.state.failing_connects.store(1, Ordering::Release);
    let Err(DatabaseError::Transient { label, .. }) = pool.acquire().await else {
        panic!("Expected the connection attempt to fail");
    };
    assert_eq!(label, "connecting to the database");
    // The slot was given back
    assert!(pool.acquire().await.is_ok());
}

#[tokio::test]
async fn close() {
    init_logs();
    let (pool, _driver) = pool(2);
    drop(pool.acquire().await.unwrap());
    let borrowed = pool.acquire().await.unwrap();
    pool.close().await;
    assert!(pool.is_closed());
    assert!(matches!(pool.acquire().await, Err(DatabaseError::PoolClosed)));
    assert_eq!(pool.open_connections(), 1);
    drop(borrowed);
    assert_eq!(pool.open_connections(), 0);
    assert_eq!(pool.idle_connections(), 0);
}
