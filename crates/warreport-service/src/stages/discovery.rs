//! Battle discovery stage.
//!
//! Polls the battle-list endpoint on a fixed interval and seeds the
//! processing queue with newly reported rooms. The cursor only advances
//! after a fully successful cycle, so an upstream failure is retried with
//! the same query next cycle.

use crate::config::DiscoveryConfig;
use crate::shutdown::ShutdownCoordinator;
use screeps_api::{BattleQuery, ScreepsApi};
use std::sync::Arc;
use tracing::{debug, info, warn};
use warreport_core::{BattleCandidate, BattleStateStore, DiscoveryCursor, ReconstructionState, RoomId};
use warreport_storage::RotatingQueue;

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;

pub struct DiscoveryStage {
    api: Arc<dyn ScreepsApi>,
    cursor: DiscoveryCursor,
    states: BattleStateStore,
    processing: RotatingQueue<BattleCandidate>,
    config: DiscoveryConfig,
    shutdown: ShutdownCoordinator,
}

impl DiscoveryStage {
    pub fn new(
        api: Arc<dyn ScreepsApi>,
        cursor: DiscoveryCursor,
        states: BattleStateStore,
        processing: RotatingQueue<BattleCandidate>,
        config: DiscoveryConfig,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            api,
            cursor,
            states,
            processing,
            config,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            "Discovery stage started"
        );
        loop {
            if self.shutdown.is_triggered() {
                break;
            }
            if let Err(error) = self.cycle().await {
                warn!(%error, "Discovery cycle failed; retrying next cycle");
            }
            if !self
                .shutdown
                .sleep_or_shutdown(self.config.poll_interval())
                .await
            {
                break;
            }
        }
        info!("Discovery stage stopped");
    }

    /// One poll of the battle list.
    async fn cycle(&self) -> anyhow::Result<()> {
        let query = match self.cursor.get().await? {
            Some(tick) => BattleQuery::SinceTick(tick),
            None => BattleQuery::Interval(self.config.lookback_ticks),
        };
        let battles = self.api.battles(query).await?;

        let mut fresh = Vec::new();
        for listed in &battles.rooms {
            let room = match RoomId::new(&listed.id) {
                Ok(room) => room,
                Err(error) => {
                    warn!(room = %listed.id, %error, "Skipping room with unusable name");
                    continue;
                }
            };

            // A room with in-progress state is already in rotation; a fresh
            // seed would throw away its progress.
            if self.states.get(&room).await?.is_some() {
                debug!(room = %room, "Room already being reconstructed");
                continue;
            }

            let state = ReconstructionState::awaiting(
                listed.last_pvp_time,
                battles
                    .time
                    .saturating_add(self.config.continuation_budget_ticks),
            );
            self.states.put(&room, &state).await?;
            fresh.push(BattleCandidate {
                room,
                discovered_tick: listed.last_pvp_time,
            });
        }

        if !fresh.is_empty() {
            info!(count = fresh.len(), tick = %battles.time, "Discovered battles");
            self.processing.push_back(&fresh).await?;
        }
        self.cursor.set(battles.time).await?;
        Ok(())
    }
}
