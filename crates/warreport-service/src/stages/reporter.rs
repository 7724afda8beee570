//! Battle reporting stage.
//!
//! Drains the reporting queue. A report leaves the queue once it has been
//! published or judged not worth publishing; a failed publish leaves it in
//! place for the next rotation, giving indefinite retry.

use crate::config::ReporterConfig;
use crate::notify::Notifier;
use crate::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warreport_core::{format_message, is_reportable, FinalizedBattleReport};
use warreport_storage::RotatingQueue;

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Completed,
    Deferred,
    Idle,
}

pub struct ReporterStage {
    reporting: RotatingQueue<FinalizedBattleReport>,
    notifier: Arc<dyn Notifier>,
    config: ReporterConfig,
    shutdown: ShutdownCoordinator,
}

impl ReporterStage {
    pub fn new(
        reporting: RotatingQueue<FinalizedBattleReport>,
        notifier: Arc<dyn Notifier>,
        config: ReporterConfig,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            reporting,
            notifier,
            config,
            shutdown,
        }
    }

    pub async fn run(self) {
        info!("Reporter stage started");
        loop {
            if self.shutdown.is_triggered() {
                break;
            }
            let outcome = match self.step().await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(%error, "Reporter step failed; backing off");
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
        info!("Reporter stage stopped");
    }

    /// Take the next queued report and publish it if warranted.
    async fn step(&self) -> anyhow::Result<StepOutcome> {
        let Some(entry) = self.reporting.take_next().await? else {
            return Ok(StepOutcome::Idle);
        };
        let report = &entry.body;

        if !is_reportable(report) {
            debug!(
                room = %report.room,
                players = report.player_count(),
                "Skipping battle without real opposition"
            );
            self.reporting.complete(&entry).await?;
            return Ok(StepOutcome::Completed);
        }

        let text = format_message(report);
        match self.notifier.publish(&text).await {
            Ok(()) => {
                info!(room = %report.room, "Published battle report");
                self.reporting.complete(&entry).await?;
                Ok(StepOutcome::Completed)
            }
            Err(error) => {
                // Left in the queue; rotation will bring it back around.
                warn!(room = %report.room, %error, "Publish failed; will retry");
                Ok(StepOutcome::Deferred)
            }
        }
    }
}
