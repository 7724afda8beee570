//! Wire types for the Screeps APIs.
//!
//! Only the fields the reconstruction pipeline consumes are modeled; the
//! history JSON carries far more per-object detail than we look at, and
//! unknown fields are ignored during deserialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Width of a history window in ticks. Windows are start-aligned to
/// multiples of this value.
pub const WINDOW_TICKS: u64 = 20;

// ============================================================================
// Tick
// ============================================================================

/// A point in simulation time. All scheduling and history windows are
/// expressed in ticks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(u64);

impl Tick {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Floor this tick to the start of the history window containing it.
    pub fn align_to_window(&self) -> Tick {
        Tick(self.0 - self.0 % WINDOW_TICKS)
    }

    /// Start of the next history window.
    pub fn next_window(&self) -> Tick {
        Tick(self.0 + WINDOW_TICKS)
    }

    /// Start of the previous history window, or `None` at the start of time.
    pub fn previous_window(&self) -> Option<Tick> {
        self.0.checked_sub(WINDOW_TICKS).map(Tick)
    }

    pub fn saturating_add(&self, ticks: u64) -> Tick {
        Tick(self.0.saturating_add(ticks))
    }

    pub fn saturating_sub(&self, ticks: u64) -> Tick {
        Tick(self.0.saturating_sub(ticks))
    }

    /// Distance from `other` to `self`, clamped at zero when `other` is
    /// later than `self`.
    pub fn gap_since(&self, other: Tick) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Tick {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// Room history
// ============================================================================

/// Outcome of a room-history fetch.
///
/// History windows become available only after a delay, and sometimes never
/// become available at all. A 404 is therefore an expected answer, not an
/// error.
#[derive(Debug, Clone)]
pub enum HistoryFetch {
    /// The window has been generated and was retrieved.
    Available(RoomHistory),
    /// The window has not been generated (HTTP 404).
    NotYetAvailable,
}

/// One 20-tick window of recorded room state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomHistory {
    #[serde(default)]
    pub room: String,

    /// Start tick of the window (aligned to a multiple of 20).
    #[serde(default)]
    pub base: Tick,

    /// Per-tick object snapshots. A `None` snapshot denotes an object
    /// removed at that tick.
    #[serde(default)]
    pub ticks: BTreeMap<Tick, BTreeMap<String, Option<ObjectSnapshot>>>,
}

impl RoomHistory {
    /// A recording gap: the window exists but recorded no ticks.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Earliest recorded tick in this window, if any.
    pub fn earliest_tick(&self) -> Option<Tick> {
        self.ticks.keys().next().copied()
    }

    /// Latest recorded tick in this window, if any.
    pub fn latest_tick(&self) -> Option<Tick> {
        self.ticks.keys().next_back().copied()
    }
}

/// Snapshot of one object at one tick.
///
/// `type` is only present the first time an object appears in a window;
/// subsequent ticks carry deltas. The engine only classifies objects from
/// snapshots that do carry a type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Owning player id (opaque; resolved to a username lazily).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<BodyPart>>,

    #[serde(
        rename = "actionLog",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub action_log: Option<ActionLog>,

    /// Controller level, present on controller snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
}

impl ObjectSnapshot {
    pub fn is_creep(&self) -> bool {
        self.object_type.as_deref() == Some("creep")
    }

    pub fn is_controller(&self) -> bool {
        self.object_type.as_deref() == Some("controller")
    }
}

/// Controller reservation: holder of an unowned room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub user: String,
}

/// The subset of a creep's action log that counts as hostility.
///
/// Values on the wire are per-action detail objects (or null); we only care
/// whether an action was recorded at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranged_attack: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranged_mass_attack: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranged_heal: Option<serde_json::Value>,
}

impl ActionLog {
    /// Any recorded attack or heal action makes the tick hostile.
    pub fn is_hostile(&self) -> bool {
        self.attack.is_some()
            || self.ranged_attack.is_some()
            || self.ranged_mass_attack.is_some()
            || self.heal.is_some()
            || self.ranged_heal.is_some()
    }
}

// ============================================================================
// Creep bodies
// ============================================================================

/// One element of a creep body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPart {
    #[serde(rename = "type")]
    pub part: PartType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<u32>,
}

/// The eight Screeps body part types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartType {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl PartType {
    /// Wire name of the part type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Work => "work",
            Self::Carry => "carry",
            Self::Attack => "attack",
            Self::RangedAttack => "ranged_attack",
            Self::Heal => "heal",
            Self::Claim => "claim",
            Self::Tough => "tough",
        }
    }

    /// Uppercase first letter of the wire name, used for fallback role
    /// labels of unrecognized body archetypes.
    pub fn initial(&self) -> char {
        self.as_str()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }
}

// ============================================================================
// Battle list
// ============================================================================

/// Query parameter for the battle-list endpoint.
#[derive(Debug, Clone, Copy)]
pub enum BattleQuery {
    /// Battles since a known tick (normal operation). The endpoint names
    /// this parameter `start` on the wire.
    SinceTick(Tick),
    /// Battles within a fixed lookback interval (first run / cursor expiry).
    Interval(u64),
}

impl BattleQuery {
    pub fn as_query_pair(&self) -> (&'static str, String) {
        match self {
            Self::SinceTick(tick) => ("start", tick.to_string()),
            Self::Interval(ticks) => ("interval", ticks.to_string()),
        }
    }
}

/// Response of the battle-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BattleList {
    #[serde(default)]
    pub ok: i64,
    pub time: Tick,
    #[serde(default)]
    pub rooms: Vec<BattleListRoom>,
}

/// One room with recent hostile activity.
#[derive(Debug, Clone, Deserialize)]
pub struct BattleListRoom {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "lastPvpTime")]
    pub last_pvp_time: Tick,
}

// ============================================================================
// Users and alliances
// ============================================================================

/// Response of the user-find endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserFind {
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserInfo {
    #[serde(default)]
    pub username: Option<String>,
}

/// One alliance in the roster. Other roster fields (name, abbreviation,
/// color) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AllianceInfo {
    #[serde(default)]
    pub members: Vec<String>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
