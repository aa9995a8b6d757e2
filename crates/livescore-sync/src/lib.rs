//! Live score synchronization engine
//!
//! Polls The Odds API for odds and scores of one selected sport, merges both
//! feeds into a single canonical event list and publishes it to whichever
//! presentation layer subscribes.
//!
//! # Components
//! - `client`: `OddsApiClient`, typed errors, one-time catalogue cache
//! - `reconcile`: odds + scores -> `CanonicalEvent`
//! - `sync`: `SyncController`, the polling state machine
//! - `view`: pure filter/sort helpers for presentation adapters
//!
//! # Source
//! - API reference: https://the-odds-api.com/liveapi/guides/v4/

pub mod client;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod sync;
pub mod types;
pub mod view;

pub use client::{OddsApiClient, Upstream};
pub use config::SyncConfig;
pub use error::SyncError;
pub use sync::{CycleOutcome, SyncController, SyncPhase, SyncSnapshot};
pub use types::*;
pub use view::{filter_events, sort_events, SortKey, StatusFilter};

/// Official Odds API base URL
pub const ODDS_API_BASE: &str = "https://api.the-odds-api.com";

/// Interval between odds/scores refreshes while a session is steady
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Leagues the engine knows how to present.
/// The upstream catalogue is intersected with this list.
pub const SUPPORTED_SPORTS: &[&str] = &["americanfootball_nfl", "basketball_nba", "soccer_epl"];
