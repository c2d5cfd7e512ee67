use time::macros::datetime;
use trophy_core::{AchievementRecord, DatabaseManager, Driver};
use uuid::Uuid;

/// A player joins twice and unlocks the same achievement twice.
pub async fn scenario<D: Driver>(manager: &DatabaseManager<D>) {
    let player = Uuid::new_v4();
    assert_eq!(
        manager
            .increment_and_get_connections(player, 1)
            .await
            .expect("First connection"),
        1
    );
    assert_eq!(
        manager
            .increment_and_get_connections(player, 2)
            .await
            .expect("Second connection"),
        3
    );

    let first = datetime!(2025-06-01 18:30:00.125);
    let second = datetime!(2025-06-02 09:15:42.5);
    manager.register_achievement(player, "First Join", first).await;
    manager.register_achievement(player, "First Join", second).await;
    assert_eq!(
        manager
            .player_achievements(player)
            .await
            .expect("Could not read the achievements"),
        [AchievementRecord {
            name: "First Join".into(),
            awarded: second,
        }]
    );
}
