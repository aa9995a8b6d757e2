//! Live data synchronization
//!
//! # Components
//! - `SyncController`: session state machine, timer and retry authority
//! - `SyncSnapshot`: the only state presentation adapters see
//! - `SyncPhase` / `CycleOutcome`: observable phase and per-call outcome

mod controller;
mod session;

pub use controller::SyncController;
pub use session::{CycleOutcome, SyncPhase, SyncSnapshot};
