//! The three long-running pipeline stages.
//!
//! Discovery seeds the processing queue, the worker drains it through the
//! reconstruction engine into the reporting queue, and the reporter drains
//! that into notifications. Stages communicate only through the queue
//! contracts and share nothing but the store and the shutdown signal.

pub mod discovery;
pub mod reporter;
pub mod worker;

pub use discovery::DiscoveryStage;
pub use reporter::ReporterStage;
pub use worker::WorkerStage;
