//! Battle data model.
//!
//! [`ReconstructionState`] is the per-room accumulator for in-progress
//! reconstruction, persisted between worker passes. It has exactly two
//! states: before any history has been collected the only knowledge is
//! where to start scanning; after the first successful window the record
//! accumulates monotonically until finalization.

use crate::{RoomId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;

/// Cumulative creep counts per player per role label.
pub type PlayerCreepCounts = BTreeMap<String, BTreeMap<String, u32>>;

/// A newly discovered battle, queued for reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleCandidate {
    pub room: RoomId,
    pub discovered_tick: Tick,
}

/// Per-room reconstruction state.
///
/// The two variants are mutually exclusive by construction: a room either
/// still awaits its first history window or is accumulating merged windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ReconstructionState {
    /// No history collected yet; only the tick to begin scanning from.
    AwaitingFirstWindow {
        /// First tick to check (back-search starts from its window).
        tick_to_check: Tick,
        /// Hard forward deadline for the whole reconstruction.
        stop_checking_at: Tick,
    },
    /// At least one window merged; the record grows from here.
    Accumulating(BattleAccumulator),
}

impl ReconstructionState {
    /// Seed state for a freshly discovered battle.
    pub fn awaiting(tick_to_check: Tick, stop_checking_at: Tick) -> Self {
        Self::AwaitingFirstWindow {
            tick_to_check,
            stop_checking_at,
        }
    }
}

/// The accumulating half of [`ReconstructionState`].
///
/// Invariants maintained by the engine:
/// - `player_creep_counts` and `creeps_found` only grow
/// - `earliest_hostilities_detected` only decreases,
///   `latest_hostilities_detected` only increases
/// - `max_tick_checked` is the start tick of the next window to merge
///   forward, i.e. the highest-aligned boundary of the merged region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleAccumulator {
    pub max_tick_checked: Tick,

    pub player_creep_counts: PlayerCreepCounts,

    /// Dedup set preventing double-counting a creep across overlapping
    /// windows.
    pub creeps_found: BTreeSet<String>,

    /// Room controller owner (or reservation holder), resolved once and
    /// frozen.
    pub owner: Option<String>,

    /// Controller level; 0 when reserved or unowned.
    pub rcl: u32,

    pub earliest_hostilities_detected: Tick,
    pub latest_hostilities_detected: Tick,

    /// Set when this battle is a confirmed continuation of the previously
    /// reported battle in the room. Collision detection itself is an
    /// unfinished feature; the flag is carried so the stored format does
    /// not change when it lands.
    pub earliest_hostilities_collided: bool,

    pub stop_checking_at: Tick,
}

impl BattleAccumulator {
    /// Fresh accumulator after the first successful window fetch.
    pub fn start(tick_to_check: Tick, stop_checking_at: Tick, first_window: Tick) -> Self {
        Self {
            max_tick_checked: first_window,
            player_creep_counts: PlayerCreepCounts::new(),
            creeps_found: BTreeSet::new(),
            owner: None,
            rcl: 0,
            earliest_hostilities_detected: tick_to_check,
            latest_hostilities_detected: tick_to_check,
            earliest_hostilities_collided: false,
            stop_checking_at,
        }
    }

    /// Count a newly seen creep for a player under a role label.
    pub fn record_creep(&mut self, creep_id: &str, player: &str, role_label: String) {
        self.creeps_found.insert(creep_id.to_string());
        *self
            .player_creep_counts
            .entry(player.to_string())
            .or_default()
            .entry(role_label)
            .or_insert(0) += 1;
    }

    /// Widen the hostility envelope to include a hostile tick.
    pub fn widen_envelope(&mut self, hostile_tick: Tick) {
        if hostile_tick < self.earliest_hostilities_detected {
            self.earliest_hostilities_detected = hostile_tick;
        }
        if hostile_tick > self.latest_hostilities_detected {
            self.latest_hostilities_detected = hostile_tick;
        }
    }
}

/// Immutable output of a completed reconstruction, queued for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedBattleReport {
    pub room: RoomId,

    pub player_creep_counts: PlayerCreepCounts,

    /// Alliance tag per participating player; `None` for unaligned
    /// players.
    pub alliances: BTreeMap<String, Option<String>>,

    pub owner: Option<String>,
    pub rcl: u32,

    pub earliest_hostilities_detected: Tick,
    pub latest_hostilities_detected: Tick,

    /// `latest - earliest + 1`.
    pub duration: u64,

    /// True when collection stopped at the deadline while hostilities were
    /// still being found.
    pub battle_still_ongoing: bool,
}

impl FinalizedBattleReport {
    /// Distinct players observed in the battle.
    pub fn player_count(&self) -> usize {
        self.player_creep_counts.len()
    }

    /// Total creeps counted for one player.
    pub fn total_creeps_of(&self, player: &str) -> u32 {
        self.player_creep_counts
            .get(player)
            .map(|roles| roles.values().sum())
            .unwrap_or(0)
    }
}
