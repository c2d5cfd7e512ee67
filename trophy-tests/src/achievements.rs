use time::macros::datetime;
use trophy_core::{AchievementRecord, DatabaseManager, Driver};
use uuid::Uuid;

pub async fn achievements<D: Driver>(manager: &DatabaseManager<D>) {
    let player = Uuid::new_v4();
    let other = Uuid::new_v4();

    // Empty
    assert!(manager.player_achievements(player).await.unwrap().is_empty());
    assert_eq!(manager.player_achievement_count(player).await.unwrap(), 0);
    assert!(!manager.has_player_achievement(player, "Miner").await.unwrap());

    // Sub millisecond precision is dropped
    manager
        .register_achievement(player, "Miner", datetime!(2025-01-05 12:00:00.123456789))
        .await;
    manager
        .register_achievement(player, "Builder", datetime!(2025-01-04 08:00))
        .await;
    manager
        .register_achievement(player, "Archer", datetime!(2025-01-05 12:00:00.123))
        .await;
    manager
        .register_achievement(other, "Miner", datetime!(2024-12-31 23:59:59.999))
        .await;
    // Quotes and non ASCII text are bound, never spliced
    manager
        .register_achievement(other, "Ender's \"Dragon\" - ⚔", datetime!(2025-01-01 00:00))
        .await;

    assert_eq!(
        manager.player_achievements(player).await.unwrap(),
        [
            AchievementRecord {
                name: "Builder".into(),
                awarded: datetime!(2025-01-04 08:00),
            },
            AchievementRecord {
                name: "Archer".into(),
                awarded: datetime!(2025-01-05 12:00:00.123),
            },
            AchievementRecord {
                name: "Miner".into(),
                awarded: datetime!(2025-01-05 12:00:00.123),
            },
        ]
    );
    assert_eq!(manager.player_achievement_count(player).await.unwrap(), 3);
    assert_eq!(manager.player_achievement_count(other).await.unwrap(), 2);
    assert!(manager.has_player_achievement(player, "Miner").await.unwrap());
    assert!(!manager.has_player_achievement(player, "Ender's \"Dragon\" - ⚔").await.unwrap());
    assert!(
        manager
            .has_player_achievement(other, "Ender's \"Dragon\" - ⚔")
            .await
            .unwrap()
    );

    // Registering again is idempotent
    for _ in 0..3 {
        manager
            .register_achievement(other, "Miner", datetime!(2025-02-01 10:00))
            .await;
    }
    assert_eq!(manager.player_achievement_count(other).await.unwrap(), 2);
    assert_eq!(
        manager.player_achievements(other).await.unwrap().last(),
        Some(&AchievementRecord {
            name: "Miner".into(),
            awarded: datetime!(2025-02-01 10:00),
        })
    );
}
