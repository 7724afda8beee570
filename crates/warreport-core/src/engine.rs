//! Battle reconstruction engine.
//!
//! `advance` drives one room's reconstruction as far as the available
//! history allows: an initial fetch, a backward search for the start of
//! hostilities, then a forward search that either finds the end or runs
//! out of generated windows and yields until more appear.
//!
//! The engine is a pure state transformer over [`ReconstructionState`];
//! persistence and queue bookkeeping belong to the caller.

use crate::identity::{IdentityError, IdentityResolver};
use crate::model::{BattleAccumulator, FinalizedBattleReport, ReconstructionState};
use crate::roles::{classify, CreepRole};
use crate::RoomId;
use screeps_api::{ApiError, HistoryFetch, RoomHistory, ScreepsApi, Tick};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// A quiet span of this many ticks separates two battles.
pub const GAP_THRESHOLD_TICKS: u64 = 50;

/// How long to keep waiting, in ticks, before giving up on a room whose
/// history never materializes, and how far past discovery a single battle
/// may grow before being reported as still ongoing.
pub const GIVE_UP_TICKS: u64 = 2000;

/// Game-reserved user ids (invaders and source keepers). Their creeps
/// never count as battle participants.
const NPC_USER_IDS: &[&str] = &["2", "3"];

/// Outcome of one `advance` call.
#[derive(Debug)]
pub enum Advance {
    /// Reconstruction completed; the caller owns queueing the report.
    Finalized(FinalizedBattleReport),
    /// More history is needed; persist this state and retry later.
    NotReady(ReconstructionState),
    /// The room's history never materialized; drop it permanently.
    Abandoned,
}

/// Errors that can occur while advancing a reconstruction.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl EngineError {
    /// Whether retrying the advance later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(e) => e.is_transient(),
            Self::Identity(e) => e.is_transient(),
        }
    }
}

/// Search direction of a segment merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Scanning backward for the start of hostilities.
    Earliest,
    /// Scanning forward for the end of hostilities.
    Latest,
}

/// Drives per-room battle reconstruction against the history feed.
#[derive(Clone)]
pub struct ReconstructionEngine {
    api: Arc<dyn ScreepsApi>,
    identity: IdentityResolver,
}

impl ReconstructionEngine {
    pub fn new(api: Arc<dyn ScreepsApi>, identity: IdentityResolver) -> Self {
        Self { api, identity }
    }

    /// Advance a room's reconstruction as far as available history allows.
    pub async fn advance(
        &self,
        room: &RoomId,
        state: ReconstructionState,
        current_tick: Tick,
    ) -> Result<Advance, EngineError> {
        match state {
            ReconstructionState::AwaitingFirstWindow {
                tick_to_check,
                stop_checking_at,
            } => {
                self.advance_initial(room, tick_to_check, stop_checking_at, current_tick)
                    .await
            }
            ReconstructionState::Accumulating(acc) => {
                self.search_forward(room, acc, None, current_tick).await
            }
        }
    }

    /// Initial fetch plus the backward search, then hand off forward.
    async fn advance_initial(
        &self,
        room: &RoomId,
        tick_to_check: Tick,
        stop_checking_at: Tick,
        current_tick: Tick,
    ) -> Result<Advance, EngineError> {
        let window = tick_to_check.align_to_window();
        let segment = match self.api.room_history(room.as_str(), window).await? {
            HistoryFetch::Available(segment) => segment,
            HistoryFetch::NotYetAvailable => {
                if current_tick.gap_since(window) > GIVE_UP_TICKS {
                    warn!(
                        room = %room,
                        window = %window,
                        current_tick = %current_tick,
                        "First history window never appeared; abandoning room"
                    );
                    return Ok(Advance::Abandoned);
                }
                return Ok(Advance::NotReady(ReconstructionState::awaiting(
                    tick_to_check,
                    stop_checking_at,
                )));
            }
        };

        let mut acc = BattleAccumulator::start(tick_to_check, stop_checking_at, window);
        self.search_backward(room, &mut acc, &segment).await?;

        // The forward pass re-merges the initial segment under the forward
        // boundary test; the dedup set keeps counts stable.
        self.search_forward(room, acc, Some(segment), current_tick)
            .await
    }

    /// Walk older windows until a boundary or the edge of recorded history.
    async fn search_backward(
        &self,
        room: &RoomId,
        acc: &mut BattleAccumulator,
        initial_segment: &RoomHistory,
    ) -> Result<(), EngineError> {
        if !self.merge(acc, initial_segment, Direction::Earliest).await? {
            return Ok(());
        }

        let mut window = acc.max_tick_checked;
        while let Some(older) = window.previous_window() {
            let segment = match self.api.room_history(room.as_str(), older).await? {
                HistoryFetch::Available(segment) => segment,
                // An older window that was never generated means no
                // earlier history exists.
                HistoryFetch::NotYetAvailable => break,
            };
            if !self.merge(acc, &segment, Direction::Earliest).await? {
                break;
            }
            window = older;
        }
        Ok(())
    }

    /// Walk newer windows until a boundary, the deadline, or the edge of
    /// generated history.
    async fn search_forward(
        &self,
        room: &RoomId,
        mut acc: BattleAccumulator,
        mut prefetched: Option<RoomHistory>,
        current_tick: Tick,
    ) -> Result<Advance, EngineError> {
        loop {
            let window = acc.max_tick_checked;
            let segment = match prefetched.take() {
                Some(segment) => segment,
                None => {
                    // A window can only exist once it lies fully in the
                    // past.
                    if window.next_window() > current_tick {
                        return Ok(Advance::NotReady(ReconstructionState::Accumulating(acc)));
                    }
                    match self.api.room_history(room.as_str(), window).await? {
                        HistoryFetch::Available(segment) => segment,
                        HistoryFetch::NotYetAvailable => {
                            debug!(room = %room, window = %window, "History ends; closing battle");
                            return self.finalize(room, acc, false).await;
                        }
                    }
                }
            };

            let keep_searching = self.merge(&mut acc, &segment, Direction::Latest).await?;
            acc.max_tick_checked = window.next_window();

            if !keep_searching {
                return self.finalize(room, acc, false).await;
            }
            if acc.max_tick_checked > acc.stop_checking_at {
                info!(
                    room = %room,
                    earliest = %acc.earliest_hostilities_detected,
                    "Deadline reached while hostilities continue; forcing report"
                );
                return self.finalize(room, acc, true).await;
            }
        }
    }

    /// Merge one segment into the accumulator.
    ///
    /// Returns whether the search should continue in `direction`. The
    /// boundary test runs against the envelope as it stood before this
    /// segment; the envelope is widened afterwards either way.
    async fn merge(
        &self,
        acc: &mut BattleAccumulator,
        segment: &RoomHistory,
        direction: Direction,
    ) -> Result<bool, EngineError> {
        // An empty window is a recording gap, not evidence of peace.
        if segment.is_empty() {
            return Ok(true);
        }

        let mut earliest_hostile: Option<Tick> = None;
        let mut latest_hostile: Option<Tick> = None;

        for (&tick, objects) in &segment.ticks {
            let mut tick_hostile = false;
            for (object_id, snapshot) in objects {
                let Some(snapshot) = snapshot else { continue };

                if !tick_hostile {
                    if let Some(log) = &snapshot.action_log {
                        if log.is_hostile() {
                            tick_hostile = true;
                        }
                    }
                }

                if snapshot.is_creep() && !acc.creeps_found.contains(object_id) {
                    self.record_new_creep(acc, object_id, snapshot).await?;
                } else if acc.owner.is_none() && snapshot.is_controller() {
                    self.resolve_controller(acc, snapshot).await?;
                }
            }
            if tick_hostile {
                earliest_hostile = earliest_hostile.or(Some(tick));
                latest_hostile = Some(tick);
            }
        }

        let keep_searching = match direction {
            Direction::Earliest => {
                let edge = latest_hostile
                    .unwrap_or_else(|| segment.earliest_tick().unwrap_or(segment.base).saturating_sub(1));
                acc.earliest_hostilities_detected.gap_since(edge) < GAP_THRESHOLD_TICKS
            }
            Direction::Latest => {
                let edge = earliest_hostile
                    .unwrap_or_else(|| segment.latest_tick().unwrap_or(segment.base).saturating_add(1));
                edge.gap_since(acc.latest_hostilities_detected) < GAP_THRESHOLD_TICKS
            }
        };

        if let Some(tick) = earliest_hostile {
            acc.widen_envelope(tick);
        }
        if let Some(tick) = latest_hostile {
            acc.widen_envelope(tick);
        }

        Ok(keep_searching)
    }

    /// Classify and count a creep seen for the first time.
    async fn record_new_creep(
        &self,
        acc: &mut BattleAccumulator,
        object_id: &str,
        snapshot: &screeps_api::ObjectSnapshot,
    ) -> Result<(), EngineError> {
        // Only the snapshot introducing an object carries a body and
        // owner; delta snapshots are skipped until one does.
        let (Some(user), Some(body)) = (&snapshot.user, &snapshot.body) else {
            return Ok(());
        };
        if NPC_USER_IDS.contains(&user.as_str()) {
            acc.creeps_found.insert(object_id.to_string());
            return Ok(());
        }

        let parts: Vec<_> = body.iter().map(|p| p.part).collect();
        let role = classify(&parts);
        if let CreepRole::Unrecognized(initials) = &role {
            info!(creep = object_id, body = %initials, "Unrecognized creep archetype");
        }

        let player = self.identity.username_of(user).await?;
        acc.record_creep(object_id, &player, role.label().to_string());
        Ok(())
    }

    /// Resolve room ownership from a controller snapshot.
    async fn resolve_controller(
        &self,
        acc: &mut BattleAccumulator,
        snapshot: &screeps_api::ObjectSnapshot,
    ) -> Result<(), EngineError> {
        if let Some(user) = &snapshot.user {
            acc.owner = Some(self.identity.username_of(user).await?);
            acc.rcl = snapshot.level.unwrap_or(0);
        } else if let Some(reservation) = &snapshot.reservation {
            acc.owner = Some(self.identity.username_of(&reservation.user).await?);
            acc.rcl = 0;
        }
        Ok(())
    }

    /// Turn the accumulator into an immutable report.
    async fn finalize(
        &self,
        room: &RoomId,
        acc: BattleAccumulator,
        battle_still_ongoing: bool,
    ) -> Result<Advance, EngineError> {
        let mut alliances = BTreeMap::new();
        for player in acc.player_creep_counts.keys() {
            alliances.insert(player.clone(), self.identity.alliance_of(player).await?);
        }

        let duration = acc
            .latest_hostilities_detected
            .gap_since(acc.earliest_hostilities_detected)
            + 1;

        info!(
            room = %room,
            players = acc.player_creep_counts.len(),
            duration,
            battle_still_ongoing,
            "Finalized battle reconstruction"
        );

        Ok(Advance::Finalized(FinalizedBattleReport {
            room: room.clone(),
            player_creep_counts: acc.player_creep_counts,
            alliances,
            owner: acc.owner,
            rcl: acc.rcl,
            earliest_hostilities_detected: acc.earliest_hostilities_detected,
            latest_hostilities_detected: acc.latest_hostilities_detected,
            duration,
            battle_still_ongoing,
        }))
    }
}
