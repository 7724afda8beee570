//! # Warreport Storage
//!
//! Durable store contracts and work queues for the battle-reconstruction
//! pipeline.
//!
//! This library provides:
//! - [`store::KeyValueStore`] - the minimal persistent-store interface the
//!   pipeline requires: get/set-with-expiry, an atomic pipelined multi-set,
//!   and an atomic rotate-pop-push primitive on lists
//! - [`memory::MemoryStore`] - in-memory reference implementation used for
//!   tests and local operation
//! - [`queue::RotatingQueue`] - typed rotating FIFO with at-least-once
//!   take/complete semantics
//! - [`keys`] - every store key format and expiry in one place
//!
//! The rotate/complete protocol is the sole concurrency-control discipline:
//! `take_next` cycles through pending entries without shrinking the queue,
//! and an entry disappears only through an explicit, idempotent `complete`.

pub mod error;
pub mod keys;
pub mod memory;
pub mod queue;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use queue::{QueueEntry, RotatingQueue};
pub use store::KeyValueStore;
