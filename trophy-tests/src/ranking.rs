use time::macros::datetime;
use trophy_core::{DatabaseManager, Driver};
use uuid::Uuid;

/// Expects a manager on empty tables.
pub async fn ranking<D: Driver>(manager: DatabaseManager<D>) {
    assert!(manager.top_players(5).await.unwrap().is_empty());
    let mut players = (0..4).map(|_| Uuid::new_v4()).collect::<Vec<_>>();
    players.sort();
    for (i, player) in players.iter().enumerate() {
        for a in 0..=i {
            manager
                .register_achievement(*player, &format!("Level {a}"), datetime!(2025-03-01 10:00))
                .await;
        }
    }
    let extra = players[0];
    manager
        .register_achievement(extra, "Level 9", datetime!(2025-03-01 10:00))
        .await;
    manager
        .register_achievement(extra, "Level 8", datetime!(2025-03-01 10:00))
        .await;
    assert_eq!(
        manager.top_players(3).await.unwrap(),
        [(players[3], 4), (players[0], 3), (players[2], 3)]
    );
    assert_eq!(manager.top_players(10).await.unwrap().len(), 4);
    assert!(manager.top_players(0).await.unwrap().is_empty());
    manager.close().await;
}
