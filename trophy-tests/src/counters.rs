use crate::DEATHS;
use futures::future::join_all;
use trophy_core::{Counter, DatabaseError, DatabaseManager, Driver};
use uuid::Uuid;

pub async fn counters<D: Driver>(manager: &DatabaseManager<D>) {
    let deaths = Counter::new(DEATHS).unwrap();
    let player = Uuid::new_v4();
    let other = Uuid::new_v4();

    assert_eq!(manager.counter_value(&deaths, player).await.unwrap(), 0);
    assert_eq!(
        manager.increment_and_get_counter(&deaths, player, 0).await.unwrap(),
        0
    );
    assert_eq!(
        manager.increment_and_get_counter(&deaths, player, 7).await.unwrap(),
        7
    );
    assert_eq!(
        manager
            .increment_and_get_counter(&deaths, other, u32::MAX)
            .await
            .unwrap(),
        u32::MAX as i64
    );
    assert_eq!(
        manager
            .increment_and_get_counter(&deaths, other, u32::MAX)
            .await
            .unwrap(),
        2 * u32::MAX as i64
    );
    // Counters are independent
    assert_eq!(
        manager
            .counter_value(&Counter::CONNECTIONS, player)
            .await
            .unwrap(),
        0
    );
    assert_eq!(manager.counter_value(&deaths, player).await.unwrap(), 7);

    let unknown = Counter::new("jumps").unwrap();
    assert!(matches!(
        manager.increment_and_get_counter(&unknown, player, 1).await,
        Err(DatabaseError::Configuration(..))
    ));
}

/// Concurrent increments of one counter never lose an update.
pub async fn concurrent_increments<D: Driver>(manager: &DatabaseManager<D>) {
    let player = Uuid::new_v4();
    let previous = manager
        .increment_and_get_connections(player, 3)
        .await
        .unwrap();
    let k = 20;
    let mut totals = join_all((0..k).map(|_| manager.increment_and_get_connections(player, 1)))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("Concurrent increments failed");
    totals.sort();
    assert_eq!(totals, ((previous + 1)..=(previous + k)).collect::<Vec<_>>());
    assert_eq!(
        manager
            .counter_value(&Counter::CONNECTIONS, player)
            .await
            .unwrap(),
        previous + k
    );
    assert!(manager.pool().open_connections() <= manager.pool().size());
}
