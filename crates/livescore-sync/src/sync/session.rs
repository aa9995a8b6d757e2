//! Session state, published snapshot and the poll timer handle

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::SyncError;
use crate::types::{CanonicalEvent, Sport};

/// Controller phase
///
/// Idle -> Initializing (catalogue load or sport selection)
/// Initializing -> Steady (first successful fetch, timer armed)
/// Steady -> Refreshing -> Steady (timer tick)
/// any -> Suspended (fetch failure, timer disarmed)
/// Suspended -> Steady (manual retry only)
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Initializing,
    Steady,
    Refreshing,
    Suspended,
}

/// Result of a fetch cycle that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New state was published
    Published,
    /// Another fetch for this session was already in flight; nothing was sent
    SkippedInFlight,
    /// The sport changed while the fetch was running; its result was dropped
    Superseded,
    /// No sport selected, nothing to refresh
    NoSession,
}

/// State handed to presentation adapters
#[derive(Clone, Debug, Default, Serialize)]
pub struct SyncSnapshot {
    pub sports: Vec<Sport>,
    pub events: Vec<CanonicalEvent>,
    pub is_loading: bool,
    /// Display-ready message for the last failure
    pub error: Option<String>,
    pub phase: SyncPhase,
    pub selected_sport: Option<String>,
    pub is_polling: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Recurring poll task; aborted when dropped
pub(crate) struct PollHandle {
    join: JoinHandle<()>,
}

impl PollHandle {
    pub(crate) fn new(join: JoinHandle<()>) -> Self {
        Self { join }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Mutable state of the single active session
#[derive(Default)]
pub(crate) struct SessionState {
    /// Bumped on every sport change; results tagged with an older value are stale
    pub generation: u64,
    pub selected_sport: Option<String>,
    pub phase: SyncPhase,
    pub sports: Vec<Sport>,
    pub sports_loaded: bool,
    pub catalogue_loading: bool,
    pub events: Vec<CanonicalEvent>,
    pub is_polling: bool,
    /// Shared by initial fetch, timer ticks and manual retry
    pub is_fetching: bool,
    /// Fetch in flight with nothing to show yet
    pub events_loading: bool,
    pub last_error: Option<SyncError>,
    pub error_message: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub poll_handle: Option<PollHandle>,
}

impl SessionState {
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            sports: self.sports.clone(),
            events: self.events.clone(),
            is_loading: self.catalogue_loading || self.events_loading,
            error: self.error_message.clone(),
            phase: self.phase,
            selected_sport: self.selected_sport.clone(),
            is_polling: self.is_polling,
            last_updated: self.last_updated,
        }
    }

    /// Disarm the timer before anything else touches the session
    pub fn disarm(&mut self) {
        self.poll_handle = None;
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
        self.error_message = None;
    }

    /// Stop automatic polling and keep the error for display.
    /// Events are left untouched so the last good list stays visible.
    ///
    /// A fetch still in flight is abandoned: its result becomes stale and the
    /// in-flight flag is released before the timer task is aborted.
    pub fn suspend(&mut self, context: &str, err: SyncError) {
        if self.is_fetching {
            self.generation += 1;
            self.is_fetching = false;
            self.events_loading = false;
        }
        self.disarm();
        self.is_polling = false;
        self.phase = SyncPhase::Suspended;
        self.error_message = Some(format!("{}{}", context, err.user_message()));
        self.last_error = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suspend_stops_polling_and_formats_message() {
        let mut state = SessionState {
            is_polling: true,
            phase: SyncPhase::Steady,
            ..SessionState::default()
        };
        state.suspend("Failed to update data: ", SyncError::RateLimit);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.phase, SyncPhase::Suspended);
        assert!(!snapshot.is_polling);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("Failed to update data: Rate limit exceeded. Please try again in a moment.")
        );
        assert_eq!(state.last_error, Some(SyncError::RateLimit));
    }

    #[test]
    fn test_suspend_abandons_in_flight_fetch() {
        let mut state = SessionState {
            generation: 3,
            is_polling: true,
            is_fetching: true,
            phase: SyncPhase::Refreshing,
            ..SessionState::default()
        };
        state.suspend("Failed to fetch sports: ", SyncError::Transport("reset".into()));

        assert!(!state.is_fetching);
        assert_eq!(state.generation, 4);
        assert_eq!(state.phase, SyncPhase::Suspended);
    }

    #[test]
    fn test_suspend_after_settled_fetch_keeps_generation() {
        let mut state = SessionState { generation: 3, ..SessionState::default() };
        state.suspend("Failed to update data: ", SyncError::RateLimit);
        assert_eq!(state.generation, 3);
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SyncPhase::Suspended).unwrap();
        assert_eq!(json, "\"suspended\"");
    }

    #[test]
    fn test_loading_covers_catalogue_and_first_fetch() {
        let mut state = SessionState::default();
        assert!(!state.snapshot().is_loading);
        state.catalogue_loading = true;
        assert!(state.snapshot().is_loading);
        state.catalogue_loading = false;
        state.events_loading = true;
        assert!(state.snapshot().is_loading);
    }
}
