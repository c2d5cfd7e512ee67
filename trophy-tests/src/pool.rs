use trophy_core::{DatabaseConfig, DatabaseError, Driver};
use uuid::Uuid;

/// A saturated pool fails fast and recovers once a connection is returned.
pub async fn exhaustion<D: Driver>(driver: D, config: &DatabaseConfig) {
    let config = DatabaseConfig {
        pool_size: 1,
        connection_timeout_ms: 200,
        ..config.clone()
    };
    let manager = crate::open(driver, &config).await;
    let player = Uuid::new_v4();
    let held = manager.pool().acquire().await.unwrap();
    assert!(matches!(
        manager.increment_and_get_connections(player, 1).await,
        Err(DatabaseError::PoolExhausted(..))
    ));
    assert_eq!(manager.pool().open_connections(), 1);
    drop(held);
    assert_eq!(
        manager
            .increment_and_get_connections(player, 1)
            .await
            .unwrap(),
        1
    );
    manager.close().await;
    assert!(matches!(
        manager.increment_and_get_connections(player, 1).await,
        Err(DatabaseError::PoolClosed)
    ));
    assert_eq!(manager.pool().open_connections(), 0);
}
