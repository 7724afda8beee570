//! Store key formats and expiries.
//!
//! Every key the pipeline writes is constructed here, so the full store
//! footprint can be read in one place. Keys are versioned by the queue
//! format version so that a format change never misreads old entries.

use std::time::Duration;

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;

const PREFIX: &str = "screeps:warreport:";
const FORMAT_VERSION: &str = "1";

/// Processing queue: rooms awaiting or undergoing reconstruction.
pub fn processing_queue() -> String {
    format!("{}{}:processing_queue", PREFIX, FORMAT_VERSION)
}

/// Reporting queue: finalized reports awaiting notification.
pub fn reporting_queue() -> String {
    format!("{}{}:reporting_queue", PREFIX, FORMAT_VERSION)
}

/// Discovery cursor: highest tick already scanned for new battles.
pub fn last_checked_tick() -> String {
    format!("{}last-checked-tick", PREFIX)
}

/// Per-room in-progress reconstruction state.
pub fn ongoing_battle(room: &str) -> String {
    format!("{}ongoing-data:{}", PREFIX, room)
}

/// Last reported battle end tick for a room. Written when a battle is
/// finalized; read by the (unfinished) continuation-detection extension.
pub fn last_battle_end(room: &str) -> String {
    format!("{}last-finished-battle:{}", PREFIX, room)
}

/// Username cache entry for an opaque player id.
pub fn username(user_id: &str) -> String {
    format!("{}cache:username:{}", PREFIX, user_id)
}

/// Per-user alliance cache entry.
pub fn alliance(username: &str) -> String {
    format!("{}cache:alliance:{}", PREFIX, username)
}

/// Freshness flag for the alliance roster as a whole.
pub fn alliances_fetched() -> String {
    format!("{}fetched-alliance-cache", PREFIX)
}

/// Usernames change rarely; five hours bounds the staleness.
pub const USERNAME_EXPIRY: Duration = Duration::from_secs(60 * 60 * 5);

/// Per-user alliance entries outlive the roster flag slightly so lookups
/// keep answering while a refresh is due.
pub const ALLIANCE_EXPIRY: Duration = Duration::from_secs(60 * 60 * 5);

/// Roster freshness window; expiry triggers a full roster refresh.
pub const ALLIANCES_FETCHED_EXPIRY: Duration = Duration::from_secs(60 * 60 * 4);

/// If reconstruction state is still around after three days, something has
/// gone wrong and it can be dropped.
pub const ONGOING_BATTLE_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 3);

/// Cursor expiry; on restart after this long, discovery falls back to a
/// bounded lookback window instead of an unbounded one.
pub const LAST_CHECKED_TICK_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Last-reported-battle markers stick around long enough to catch any
/// plausible continuation.
pub const LAST_BATTLE_END_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 10);
