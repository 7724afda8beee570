//! # Warreport Core
//!
//! Domain logic for reconstructing player-vs-player battles from the
//! Screeps room-history feed.
//!
//! Battles are never reported atomically by the source API: evidence
//! arrives piecemeal in fixed 20-tick windows that become available only
//! after a delay and sometimes never at all. This crate owns the state
//! machine that merges successive windows into a growing battle record,
//! decides when a battle has started and ended, and emits a finalized
//! report.
//!
//! ## Architecture
//!
//! - Business logic depends only on trait abstractions
//!   ([`screeps_api::ScreepsApi`], [`warreport_storage::KeyValueStore`])
//! - Infrastructure implementations are injected at construction time
//! - Nothing here owns a loop; the pipeline stages in the service crate
//!   drive the engine through the queue contracts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod engine;
pub mod identity;
pub mod model;
pub mod persistence;
pub mod report;
pub mod roles;

pub use engine::{Advance, EngineError, ReconstructionEngine};
pub use identity::{IdentityError, IdentityResolver};
pub use model::{BattleCandidate, FinalizedBattleReport, ReconstructionState};
pub use persistence::{BattleStateStore, DiscoveryCursor};
pub use report::{format_message, is_reportable};
pub use roles::{classify, CreepRole};

// Re-export the time unit everything is expressed in.
pub use screeps_api::Tick;

// ============================================================================
// Domain Identifier Types
// ============================================================================

/// Name of a room in the persistent world, e.g. `E15N53`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a new room id with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "room_id".to_string(),
            });
        }

        if !name.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ValidationError::InvalidFormat {
                field: "room_id".to_string(),
                message: "only printable ASCII allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the room name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Validation errors for domain identifiers.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}
