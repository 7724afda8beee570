//! Reconstruction worker stage.
//!
//! Rotates through the processing queue, advancing one room per step. A
//! room leaves the queue only when its reconstruction finalizes, is
//! abandoned, or has lost its state; everything else, upstream failures
//! included, keeps it in rotation.

use crate::config::WorkerConfig;
use crate::shutdown::ShutdownCoordinator;
use tracing::{debug, info, warn};
use warreport_core::{
    Advance, BattleCandidate, BattleStateStore, DiscoveryCursor, FinalizedBattleReport,
    ReconstructionEngine, Tick,
};
use warreport_storage::RotatingQueue;

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

/// What one worker step accomplished, deciding whether to delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    /// An entry left the queue; look for more work immediately.
    Completed,
    /// The room needs more history; it stays in rotation.
    Deferred,
    /// Nothing to do.
    Idle,
}

pub struct WorkerStage {
    engine: ReconstructionEngine,
    states: BattleStateStore,
    cursor: DiscoveryCursor,
    processing: RotatingQueue<BattleCandidate>,
    reporting: RotatingQueue<FinalizedBattleReport>,
    config: WorkerConfig,
    shutdown: ShutdownCoordinator,
}

impl WorkerStage {
    pub fn new(
        engine: ReconstructionEngine,
        states: BattleStateStore,
        cursor: DiscoveryCursor,
        processing: RotatingQueue<BattleCandidate>,
        reporting: RotatingQueue<FinalizedBattleReport>,
        config: WorkerConfig,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            engine,
            states,
            cursor,
            processing,
            reporting,
            config,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!("Reconstruction worker started");
        loop {
            if self.shutdown.is_triggered() {
                break;
            }
            let outcome = match self.step().await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(%error, "Worker step failed; backing off");
                    StepOutcome::Deferred
                }
            };
            if outcome != StepOutcome::Completed
                && !self
                    .shutdown
                    .sleep_or_shutdown(self.config.retry_delay())
                    .await
            {
                break;
            }
        }
        info!("Reconstruction worker stopped");
    }

    /// Take the next queued room and advance it once.
    async fn step(&self) -> anyhow::Result<StepOutcome> {
        let Some(entry) = self.processing.take_next().await? else {
            return Ok(StepOutcome::Idle);
        };
        let room = entry.body.room.clone();

        let Some(state) = self.states.get(&room).await? else {
            // State expired or was never written; without it the entry is
            // unprocessable.
            warn!(room = %room, "No reconstruction state for queued room; dropping");
            self.processing.complete(&entry).await?;
            return Ok(StepOutcome::Completed);
        };

        // The cursor tracks the latest battle-list timestamp, which is the
        // best approximation of the current game tick we have. Without it
        // no forward window counts as fetchable yet.
        let current_tick = self.cursor.get().await?.unwrap_or(Tick::new(0));

        match self.engine.advance(&room, state, current_tick).await {
            Ok(Advance::Finalized(report)) => {
                self.states
                    .record_battle_end(&room, report.latest_hostilities_detected)
                    .await?;
                self.reporting.push_back(&[report]).await?;
                self.states.clear(&room).await?;
                self.processing.complete(&entry).await?;
                Ok(StepOutcome::Completed)
            }
            Ok(Advance::Abandoned) => {
                self.states.clear(&room).await?;
                self.processing.complete(&entry).await?;
                Ok(StepOutcome::Completed)
            }
            Ok(Advance::NotReady(state)) => {
                debug!(room = %room, "Room not ready; keeping in rotation");
                self.states.put(&room, &state).await?;
                Ok(StepOutcome::Deferred)
            }
            Err(error) => {
                // Upstream failures of any kind leave the room in rotation;
                // the state TTL bounds how long a broken room is retried.
                warn!(
                    room = %room,
                    %error,
                    transient = error.is_transient(),
                    "Failed to advance room; will retry"
                );
                Ok(StepOutcome::Deferred)
            }
        }
    }
}
