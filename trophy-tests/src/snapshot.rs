use crate::DEATHS;
use time::macros::datetime;
use trophy_core::{AchievementRecord, Counter, DatabaseManager, Driver};
use uuid::{Uuid, uuid};

const ALEX: Uuid = uuid!("1b4e28ba-2fa1-11d2-883f-0016d3cca427");
const BLAKE: Uuid = uuid!("6fa459ea-ee8a-3ca4-894e-db77e160355e");
const CASEY: Uuid = uuid!("886313e1-3b8a-5372-9b90-0c9aee199e5d");

/// Logical content of the database after [`replay`].
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub achievements: Vec<(Uuid, Vec<AchievementRecord>)>,
    /// Player, connections, deaths.
    pub counters: Vec<(Uuid, i64, i64)>,
    pub ranking: Vec<(Uuid, i64)>,
}

/// Replay a fixed sequence of calls on empty tables and read everything back.
///
/// Every backend must produce [`canonical_snapshot`].
pub async fn replay<D: Driver>(manager: &DatabaseManager<D>) -> Snapshot {
    let deaths = Counter::new(DEATHS).unwrap();
    manager
        .register_achievement(ALEX, "First Join", datetime!(2025-01-01 10:00))
        .await;
    manager
        .register_achievement(ALEX, "Miner", datetime!(2025-01-01 12:00))
        .await;
    manager
        .register_achievement(ALEX, "First Join", datetime!(2025-01-02 11:30:00.123456))
        .await;
    manager
        .register_achievement(BLAKE, "First Join", datetime!(2025-01-03 08:00))
        .await;
    manager
        .register_achievement(BLAKE, "Explorer", datetime!(2025-01-03 08:00))
        .await;
    manager
        .register_achievement(CASEY, "First Join", datetime!(2025-02-01 00:00:00.999))
        .await;
    for (player, delta) in [(ALEX, 1), (ALEX, 2), (BLAKE, 1)] {
        manager
            .increment_and_get_connections(player, delta)
            .await
            .unwrap();
    }
    manager
        .increment_and_get_counter(&deaths, ALEX, 5)
        .await
        .unwrap();

    let mut snapshot = Snapshot {
        achievements: Vec::new(),
        counters: Vec::new(),
        ranking: manager.top_players(10).await.unwrap(),
    };
    for player in [ALEX, BLAKE, CASEY] {
        snapshot
            .achievements
            .push((player, manager.player_achievements(player).await.unwrap()));
        snapshot.counters.push((
            player,
            manager
                .counter_value(&Counter::CONNECTIONS, player)
                .await
                .unwrap(),
            manager.counter_value(&deaths, player).await.unwrap(),
        ));
    }
    snapshot
}

pub fn canonical_snapshot() -> Snapshot {
    let record = |name: &str, awarded| AchievementRecord {
        name: name.into(),
        awarded,
    };
    Snapshot {
        achievements: vec![
            (
                ALEX,
                vec![
                    record("Miner", datetime!(2025-01-01 12:00)),
                    record("First Join", datetime!(2025-01-02 11:30:00.123)),
                ],
            ),
            (
                BLAKE,
                vec![
                    record("Explorer", datetime!(2025-01-03 08:00)),
                    record("First Join", datetime!(2025-01-03 08:00)),
                ],
            ),
            (
                CASEY,
                vec![record("First Join", datetime!(2025-02-01 00:00:00.999))],
            ),
        ],
        counters: vec![(ALEX, 3, 5), (BLAKE, 1, 0), (CASEY, 0, 0)],
        ranking: vec![(ALEX, 2), (BLAKE, 2), (CASEY, 1)],
    }
}
