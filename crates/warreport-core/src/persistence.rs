//! Persistence wrappers for reconstruction state and the discovery cursor.
//!
//! Thin typed layers over [`KeyValueStore`]. Each wrapper owns its key
//! format and expiry so callers never touch raw keys.

use crate::model::ReconstructionState;
use crate::{RoomId, Tick};
use std::sync::Arc;
use tracing::warn;
use warreport_storage::{keys, KeyValueStore, StoreError};

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;

/// Per-room in-progress reconstruction state, stored as JSON.
#[derive(Clone)]
pub struct BattleStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl BattleStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the in-progress state of a room, if any.
    pub async fn get(&self, room: &RoomId) -> Result<Option<ReconstructionState>, StoreError> {
        let raw = self.store.get(&keys::ongoing_battle(room.as_str())).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Store the in-progress state of a room, refreshing its expiry.
    pub async fn put(
        &self,
        room: &RoomId,
        state: &ReconstructionState,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.store
            .set_with_expiry(
                &keys::ongoing_battle(room.as_str()),
                &json,
                keys::ONGOING_BATTLE_EXPIRY,
            )
            .await
    }

    /// Drop the in-progress state of a room.
    pub async fn clear(&self, room: &RoomId) -> Result<(), StoreError> {
        self.store.delete(&keys::ongoing_battle(room.as_str())).await
    }

    /// Record when the last finalized battle in a room ended.
    pub async fn record_battle_end(&self, room: &RoomId, tick: Tick) -> Result<(), StoreError> {
        self.store
            .set_with_expiry(
                &keys::last_battle_end(room.as_str()),
                &tick.value().to_string(),
                keys::LAST_BATTLE_END_EXPIRY,
            )
            .await
    }

    /// When the last finalized battle in a room ended, if known.
    pub async fn last_battle_end(&self, room: &RoomId) -> Result<Option<Tick>, StoreError> {
        let raw = self.store.get(&keys::last_battle_end(room.as_str())).await?;
        Ok(raw.and_then(|s| s.parse::<u64>().ok()).map(Tick::new))
    }
}

/// The discovery cursor: highest tick already scanned for new battles.
///
/// The cursor expires after an hour of silence. On expiry the discovery
/// stage falls back to a bounded lookback interval, so a long outage never
/// turns into an unbounded catch-up scan.
#[derive(Clone)]
pub struct DiscoveryCursor {
    store: Arc<dyn KeyValueStore>,
}

impl DiscoveryCursor {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Result<Option<Tick>, StoreError> {
        let raw = self.store.get(&keys::last_checked_tick()).await?;
        match raw {
            Some(value) => match value.parse::<u64>() {
                Ok(tick) => Ok(Some(Tick::new(tick))),
                Err(_) => {
                    warn!(value = %value, "Discarding unparseable discovery cursor");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn set(&self, tick: Tick) -> Result<(), StoreError> {
        self.store
            .set_with_expiry(
                &keys::last_checked_tick(),
                &tick.value().to_string(),
                keys::LAST_CHECKED_TICK_EXPIRY,
            )
            .await
    }
}
