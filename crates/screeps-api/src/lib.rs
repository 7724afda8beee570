//! # Screeps API
//!
//! Typed client for the read-only Screeps web APIs consumed by warreport:
//!
//! - Room history: fixed 20-tick snapshot windows of room contents
//! - Battle list: rooms with recent hostile activity
//! - User lookup: opaque player id to display name
//! - Alliance roster: alliance tag to member list
//!
//! The client distinguishes "window not yet generated" (HTTP 404, an expected
//! condition that drives defer/give-up logic upstream) from hard upstream
//! errors (other non-2xx, malformed bodies, connection failures).

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, ScreepsApi, ScreepsClient};
pub use error::ApiError;
pub use types::{
    ActionLog, AllianceInfo, BattleList, BattleListRoom, BattleQuery, BodyPart, HistoryFetch,
    ObjectSnapshot, PartType, Reservation, RoomHistory, Tick,
};
