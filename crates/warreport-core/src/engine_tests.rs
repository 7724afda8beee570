//! Tests for the reconstruction engine, driven by scripted history.

use super::*;
use async_trait::async_trait;
use screeps_api::{
    ActionLog, AllianceInfo, BattleList, BattleQuery, BodyPart, ObjectSnapshot, PartType,
    Reservation,
};
use serde_json::json;
use std::collections::HashMap;
use warreport_storage::MemoryStore;

// ============================================================================
// Scripted API
// ============================================================================

#[derive(Default)]
struct ScriptedApi {
    windows: HashMap<u64, HistoryFetch>,
    usernames: HashMap<String, String>,
    roster: BTreeMap<String, AllianceInfo>,
}

impl ScriptedApi {
    fn with_window(mut self, base: u64, fetch: HistoryFetch) -> Self {
        self.windows.insert(base, fetch);
        self
    }

    fn with_user(mut self, id: &str, name: &str) -> Self {
        self.usernames.insert(id.to_string(), name.to_string());
        self
    }

    fn with_alliance(mut self, tag: &str, members: &[&str]) -> Self {
        self.roster.insert(
            tag.to_string(),
            AllianceInfo {
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        );
        self
    }
}

#[async_trait]
impl ScreepsApi for ScriptedApi {
    async fn room_history(
        &self,
        _room: &str,
        window_start: Tick,
    ) -> Result<HistoryFetch, ApiError> {
        Ok(self
            .windows
            .get(&window_start.value())
            .cloned()
            .unwrap_or(HistoryFetch::NotYetAvailable))
    }

    async fn battles(&self, _query: BattleQuery) -> Result<BattleList, ApiError> {
        Err(ApiError::Rejected {
            endpoint: "unused".to_string(),
        })
    }

    async fn find_username(&self, user_id: &str) -> Result<String, ApiError> {
        self.usernames
            .get(user_id)
            .cloned()
            .ok_or(ApiError::MissingField {
                endpoint: "user/find".to_string(),
                field: "user.username".to_string(),
            })
    }

    async fn alliances(&self) -> Result<BTreeMap<String, AllianceInfo>, ApiError> {
        Ok(self.roster.clone())
    }
}

// ============================================================================
// Builders
// ============================================================================

fn fighter(user: &str, parts: &[PartType], hostile: bool) -> ObjectSnapshot {
    ObjectSnapshot {
        object_type: Some("creep".to_string()),
        user: Some(user.to_string()),
        body: Some(
            parts
                .iter()
                .map(|p| BodyPart {
                    part: *p,
                    hits: Some(100),
                })
                .collect(),
        ),
        action_log: hostile.then(|| ActionLog {
            attack: Some(json!({"x": 10, "y": 20})),
            ..Default::default()
        }),
        level: None,
        reservation: None,
    }
}

fn owned_controller(user: &str, level: u32) -> ObjectSnapshot {
    ObjectSnapshot {
        object_type: Some("controller".to_string()),
        user: Some(user.to_string()),
        level: Some(level),
        ..Default::default()
    }
}

fn reserved_controller(user: &str) -> ObjectSnapshot {
    ObjectSnapshot {
        object_type: Some("controller".to_string()),
        reservation: Some(Reservation {
            user: user.to_string(),
        }),
        ..Default::default()
    }
}

/// Build an available window from `(tick, objects)` pairs. A pair with no
/// objects records the tick with nothing in the room.
fn window(base: u64, ticks: Vec<(u64, Vec<(&str, ObjectSnapshot)>)>) -> HistoryFetch {
    let mut tick_map = BTreeMap::new();
    for (tick, objects) in ticks {
        let mut at_tick = BTreeMap::new();
        for (id, snapshot) in objects {
            at_tick.insert(id.to_string(), Some(snapshot));
        }
        tick_map.insert(Tick::new(tick), at_tick);
    }
    HistoryFetch::Available(RoomHistory {
        room: "E1N1".to_string(),
        base: Tick::new(base),
        ticks: tick_map,
    })
}

fn empty_window(base: u64) -> HistoryFetch {
    window(base, Vec::new())
}

/// A window whose ticks were recorded but contain no hostile action.
fn quiet_window(base: u64) -> HistoryFetch {
    window(base, vec![(base, Vec::new()), (base + 19, Vec::new())])
}

fn engine(api: ScriptedApi) -> ReconstructionEngine {
    let api: Arc<dyn ScreepsApi> = Arc::new(api);
    let store = Arc::new(MemoryStore::new());
    ReconstructionEngine::new(api.clone(), IdentityResolver::new(api, store))
}

fn room() -> RoomId {
    RoomId::new("E1N1").unwrap()
}

fn awaiting(tick_to_check: u64, stop_checking_at: u64) -> ReconstructionState {
    ReconstructionState::awaiting(Tick::new(tick_to_check), Tick::new(stop_checking_at))
}

async fn advance(
    engine: &ReconstructionEngine,
    state: ReconstructionState,
    current_tick: u64,
) -> Advance {
    engine
        .advance(&room(), state, Tick::new(current_tick))
        .await
        .unwrap()
}

fn expect_report(outcome: Advance) -> FinalizedBattleReport {
    match outcome {
        Advance::Finalized(report) => report,
        other => panic!("expected a finalized report, got {:?}", other),
    }
}

// ============================================================================
// Initial phase
// ============================================================================

#[tokio::test]
async fn test_missing_first_window_defers_without_state_change() {
    let engine = engine(ScriptedApi::default());
    let state = awaiting(105, 2105);

    let outcome = advance(&engine, state.clone(), 500).await;
    match outcome {
        Advance::NotReady(persisted) => assert_eq!(persisted, state),
        other => panic!("expected NotReady, got {:?}", other),
    }
}

#[tokio::test]
async fn test_long_missing_first_window_abandons_the_room() {
    let engine = engine(ScriptedApi::default());

    // Window 100 never appeared and the world has moved on 2100 ticks.
    let outcome = advance(&engine, awaiting(105, 2105), 2200).await;
    assert!(matches!(outcome, Advance::Abandoned));
}

// ============================================================================
// Full reconstruction
// ============================================================================

#[tokio::test]
async fn test_single_window_battle_is_reconstructed() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_user("u2", "Bob")
        .with_alliance("CCC", &["Alice"])
        .with_window(
            100,
            window(
                100,
                vec![
                    (
                        105,
                        vec![
                            ("c1", fighter("u1", &[PartType::Attack, PartType::Move], true)),
                            (
                                "c2",
                                fighter(
                                    "u2",
                                    &[PartType::Work, PartType::Carry, PartType::Move],
                                    false,
                                ),
                            ),
                            ("ctrl", owned_controller("u2", 6)),
                        ],
                    ),
                    (119, vec![]),
                ],
            ),
        )
        .with_window(80, quiet_window(80))
        .with_window(60, quiet_window(60))
        .with_window(40, quiet_window(40))
        .with_window(120, quiet_window(120))
        .with_window(140, quiet_window(140));
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);

    assert_eq!(report.player_creep_counts["Alice"]["melee_attacker"], 1);
    assert_eq!(report.player_creep_counts["Bob"]["civilian"], 1);
    assert_eq!(report.alliances["Alice"], Some("CCC".to_string()));
    assert_eq!(report.alliances["Bob"], None);
    assert_eq!(report.owner, Some("Bob".to_string()));
    assert_eq!(report.rcl, 6);
    assert_eq!(report.earliest_hostilities_detected, Tick::new(105));
    assert_eq!(report.latest_hostilities_detected, Tick::new(105));
    assert_eq!(report.duration, 1);
    assert!(!report.battle_still_ongoing);
}

#[tokio::test]
async fn test_reserved_room_reports_reserver_at_level_zero() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_user("u3", "Carol")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![
                        ("c1", fighter("u1", &[PartType::Attack, PartType::Move], true)),
                        ("ctrl", reserved_controller("u3")),
                    ],
                )],
            ),
        )
        .with_window(120, quiet_window(120))
        .with_window(140, quiet_window(140));
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert_eq!(report.owner, Some("Carol".to_string()));
    assert_eq!(report.rcl, 0);
}

#[tokio::test]
async fn test_npc_creeps_are_not_participants() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![
                        ("c1", fighter("u1", &[PartType::Attack, PartType::Move], true)),
                        ("inv", fighter("2", &[PartType::Attack, PartType::Move], true)),
                        ("sk", fighter("3", &[PartType::Attack, PartType::Move], false)),
                    ],
                )],
            ),
        )
        .with_window(120, quiet_window(120))
        .with_window(140, quiet_window(140));
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert_eq!(report.player_count(), 1);
    assert_eq!(report.total_creeps_of("Alice"), 1);
}

// ============================================================================
// Boundary behavior
// ============================================================================

#[tokio::test]
async fn test_distant_hostilities_are_a_separate_battle() {
    // Hostile at 105, next hostile at 185: 80 ticks apart, past the gap
    // threshold. The search must stop before window 180.
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(120, quiet_window(120))
        .with_window(140, quiet_window(140))
        .with_window(
            180,
            window(
                180,
                vec![(
                    185,
                    vec![("c9", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        );
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert_eq!(report.latest_hostilities_detected, Tick::new(105));
    assert!(!report.battle_still_ongoing);
    // The second skirmish's creep was never merged.
    assert_eq!(report.total_creeps_of("Alice"), 1);
}

#[tokio::test]
async fn test_empty_windows_never_end_the_search() {
    // Recording gaps at 120 and 140 carry no evidence either way; the
    // search continues through them to the quiet window at 160.
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(120, empty_window(120))
        .with_window(140, empty_window(140))
        .with_window(160, quiet_window(160));
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    // Window 160's quiet edge (180) is 75 past the last hostile tick.
    assert_eq!(report.latest_hostilities_detected, Tick::new(105));
    assert!(!report.battle_still_ongoing);
}

#[tokio::test]
async fn test_boundary_segment_hostilities_still_widen_the_envelope() {
    // The hostile tick at 159 is 54 past the envelope, so it ends the
    // search, but it is still recorded before finalizing.
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(120, quiet_window(120))
        .with_window(
            140,
            window(
                140,
                vec![(
                    159,
                    vec![("c2", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        );
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert_eq!(report.latest_hostilities_detected, Tick::new(159));
    assert!(!report.battle_still_ongoing);
}

#[tokio::test]
async fn test_backward_search_finds_earlier_hostilities() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_user("u2", "Bob")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(
            80,
            window(
                80,
                vec![(
                    87,
                    vec![(
                        "c2",
                        fighter("u2", &[PartType::RangedAttack, PartType::Move], true),
                    )],
                )],
            ),
        )
        .with_window(60, quiet_window(60))
        .with_window(40, quiet_window(40))
        .with_window(120, quiet_window(120))
        .with_window(140, quiet_window(140));
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert_eq!(report.earliest_hostilities_detected, Tick::new(87));
    assert_eq!(report.latest_hostilities_detected, Tick::new(105));
    assert_eq!(report.duration, 19);
    assert_eq!(report.player_creep_counts["Bob"]["ranged_attacker"], 1);
}

// ============================================================================
// Deferral and resumption
// ============================================================================

#[tokio::test]
async fn test_future_windows_defer_and_resumption_completes() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(
            120,
            window(
                120,
                // The same creep appears again in the next window.
                vec![(
                    125,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(140, quiet_window(140))
        .with_window(160, quiet_window(160));
    let engine = engine(api);

    // At tick 130 window 120 is not fully in the past yet.
    let outcome = advance(&engine, awaiting(105, 2105), 130).await;
    let state = match outcome {
        Advance::NotReady(state) => state,
        other => panic!("expected NotReady, got {:?}", other),
    };
    match &state {
        ReconstructionState::Accumulating(acc) => {
            assert_eq!(acc.max_tick_checked, Tick::new(120));
            assert_eq!(acc.player_creep_counts["Alice"]["melee_attacker"], 1);
        }
        other => panic!("expected accumulating state, got {:?}", other),
    }

    // Later the remaining windows exist; resumption finishes the battle
    // without double-counting the creep seen in two windows.
    let report = expect_report(advance(&engine, state, 500).await);
    assert_eq!(report.total_creeps_of("Alice"), 1);
    assert_eq!(report.latest_hostilities_detected, Tick::new(125));
    assert_eq!(report.duration, 21);
    assert!(!report.battle_still_ongoing);
}

#[tokio::test]
async fn test_missing_forward_window_closes_the_battle() {
    // Window 120 lies fully in the past at tick 500 but was never
    // generated; history simply ends there.
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        );
    let engine = engine(api);

    let report = expect_report(advance(&engine, awaiting(105, 2105), 500).await);
    assert!(!report.battle_still_ongoing);
    assert_eq!(report.latest_hostilities_detected, Tick::new(105));
}

#[tokio::test]
async fn test_deadline_forces_a_still_ongoing_report() {
    let api = ScriptedApi::default()
        .with_user("u1", "Alice")
        .with_window(
            100,
            window(
                100,
                vec![(
                    105,
                    vec![("c1", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        )
        .with_window(
            120,
            window(
                120,
                vec![(
                    130,
                    vec![("c2", fighter("u1", &[PartType::Attack, PartType::Move], true))],
                )],
            ),
        );
    let engine = engine(api);

    // Deadline at 125: merging window 120 pushes past it while
    // hostilities are still being found.
    let report = expect_report(advance(&engine, awaiting(105, 125), 500).await);
    assert!(report.battle_still_ongoing);
    assert_eq!(report.latest_hostilities_detected, Tick::new(130));
    assert_eq!(report.duration, 26);
}
