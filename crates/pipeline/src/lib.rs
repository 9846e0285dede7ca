//! Background content-filtering pipeline.
//!
//! Coordinates three independent event sources — filesystem notifications
//! over the content cache, a tailed client log, and per-file worker tasks —
//! under one level-triggered [`PatchGate`], and applies the compiled
//! blocklist to downloaded worlds at a safe moment.

pub mod error;
pub mod gate;
pub mod persist;
pub mod pipeline;
pub mod task;
pub mod tracker;
pub mod watcher;

#[cfg(test)]
mod tests;

pub use error::PipelineError;
pub use gate::{GateState, GateTimeout, PatchGate};
pub use persist::PeriodicPersister;
pub use pipeline::Pipeline;
pub use task::TaskOutcome;
pub use tracker::LoadStateTracker;
pub use watcher::ContentWatcher;
