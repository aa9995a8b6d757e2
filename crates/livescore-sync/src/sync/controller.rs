//! Sync Controller - polling state machine for the selected sport
//!
//! # Rules
//! 1. One session at a time; selecting a sport tears down the previous timer first
//! 2. Odds and scores are fetched jointly; either failing fails the cycle
//! 3. Any failure suspends automatic polling, the last good list stays published
//! 4. Only `retry()` leaves `Suspended`
//! 5. At most one fetch in flight per session; overlapping ticks are dropped
//! 6. Results for a superseded sport are discarded (generation check)

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use futures::future::join;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::session::{CycleOutcome, PollHandle, SessionState, SyncPhase, SyncSnapshot};
use crate::client::{OddsApiClient, Upstream};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::reconcile;
use crate::types::CanonicalEvent;

/// Why a fetch cycle runs; decides the error prefix and timer handling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CycleKind {
    Initial,
    Poll,
    Retry,
}

impl CycleKind {
    fn error_context(&self) -> &'static str {
        match self {
            CycleKind::Initial => "Failed to fetch data: ",
            CycleKind::Poll => "Failed to update data: ",
            CycleKind::Retry => "Retry failed: ",
        }
    }
}

const CATALOGUE_ERROR_CONTEXT: &str = "Failed to fetch sports: ";

/// Tick loop control
enum TickControl {
    Continue,
    Stop,
}

struct Inner {
    upstream: Arc<dyn Upstream>,
    poll_interval: Duration,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SyncSnapshot>,
}

/// Live data synchronization controller
///
/// Owns the single active session. Presentation adapters read state through
/// `snapshot()` / `subscribe()` and drive it with `select_sport()` and `retry()`.
pub struct SyncController {
    inner: Arc<Inner>,
}

impl SyncController {
    /// Create a controller over any upstream source
    pub fn new(upstream: Arc<dyn Upstream>, poll_interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(SyncSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                upstream,
                poll_interval,
                state: Mutex::new(SessionState::default()),
                snapshot_tx,
            }),
        }
    }

    /// Create a controller backed by `OddsApiClient`
    pub fn from_config(config: &SyncConfig) -> anyhow::Result<Self> {
        let client = OddsApiClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.poll_interval))
    }

    /// Current published state
    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Typed form of the last failure, if the session is holding one
    pub fn last_error(&self) -> Option<SyncError> {
        self.inner.lock().last_error.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.lock().phase
    }

    /// Load the sport catalogue once; later calls return without a request
    pub async fn load_sports(&self) -> Result<CycleOutcome, SyncError> {
        self.inner.load_sports().await
    }

    /// Switch the session to `sport_key` and run its first fetch
    ///
    /// Any pending timer is cancelled and in-flight results for the previous
    /// sport will be ignored when they arrive.
    pub async fn select_sport(&self, sport_key: &str) -> Result<CycleOutcome, SyncError> {
        let sport_key = sport_key.trim();
        if sport_key.is_empty() {
            return Err(SyncError::InvalidArgument("Sport key is required".to_string()));
        }

        let generation = {
            let mut st = self.inner.lock();
            st.disarm();
            st.generation += 1;
            info!(
                "Selecting sport {} (previous: {:?}, generation {})",
                sport_key, st.selected_sport, st.generation
            );
            st.selected_sport = Some(sport_key.to_string());
            st.phase = SyncPhase::Initializing;
            st.events.clear();
            st.clear_error();
            st.is_polling = false;
            st.is_fetching = true;
            st.events_loading = true;
            self.inner.publish(&st);
            st.generation
        };

        self.inner.run_cycle(generation, sport_key, CycleKind::Initial).await
    }

    /// Manual resume after a failure
    ///
    /// Reloads the catalogue if it never loaded, then re-runs the fetch for
    /// the selected sport. Success re-arms the timer; failure suspends again.
    pub async fn retry(&self) -> Result<CycleOutcome, SyncError> {
        let sports_loaded = self.inner.lock().sports_loaded;
        if !sports_loaded {
            self.inner.load_sports().await?;
        }

        let (generation, sport_key) = {
            let mut st = self.inner.lock();
            let Some(sport_key) = st.selected_sport.clone() else {
                return Ok(CycleOutcome::NoSession);
            };
            if st.is_fetching {
                debug!("Retry ignored, fetch already in flight for {}", sport_key);
                return Ok(CycleOutcome::SkippedInFlight);
            }

            info!("Manual retry for {}", sport_key);
            st.disarm();
            st.clear_error();
            st.is_fetching = true;
            st.events_loading = st.events.is_empty();
            st.phase = if st.events.is_empty() { SyncPhase::Initializing } else { SyncPhase::Refreshing };
            self.inner.publish(&st);
            (st.generation, sport_key)
        };

        self.inner.run_cycle(generation, &sport_key, CycleKind::Retry).await
    }

    /// Tear down the session (timer disarmed, in-flight results discarded)
    ///
    /// The last published events stay readable; `retry()` has nothing to
    /// resume until a sport is selected again.
    pub fn shutdown(&self) {
        let mut st = self.inner.lock();
        st.disarm();
        st.generation += 1;
        st.selected_sport = None;
        st.is_polling = false;
        st.is_fetching = false;
        st.events_loading = false;
        st.phase = SyncPhase::Idle;
        self.inner.publish(&st);
        debug!("Sync session shut down");
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.inner.lock().disarm();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, st: &SessionState) {
        self.snapshot_tx.send_replace(st.snapshot());
    }

    async fn load_sports(&self) -> Result<CycleOutcome, SyncError> {
        {
            let mut st = self.lock();
            if st.sports_loaded {
                return Ok(CycleOutcome::Published);
            }
            st.catalogue_loading = true;
            if st.phase == SyncPhase::Idle {
                st.phase = SyncPhase::Initializing;
            }
            self.publish(&st);
        }

        let result = self.upstream.sports().await;

        let mut st = self.lock();
        st.catalogue_loading = false;
        match result {
            Ok(sports) => {
                info!("Catalogue loaded: {} sports", sports.len());
                st.sports = sports;
                st.sports_loaded = true;
                if st.selected_sport.is_none() {
                    st.clear_error();
                    st.phase = SyncPhase::Initializing;
                }
                self.publish(&st);
                Ok(CycleOutcome::Published)
            }
            Err(err) => {
                warn!("Catalogue fetch failed: {}", err);
                st.suspend(CATALOGUE_ERROR_CONTEXT, err.clone());
                self.publish(&st);
                Err(err)
            }
        }
    }

    /// Fetch, reconcile and apply one cycle for `sport_key`.
    /// The caller must already hold the in-flight flag for `generation`.
    async fn run_cycle(
        self: &Arc<Self>,
        generation: u64,
        sport_key: &str,
        kind: CycleKind,
    ) -> Result<CycleOutcome, SyncError> {
        let result = fetch_events(self.upstream.as_ref(), sport_key).await;

        let mut st = self.lock();
        if st.generation != generation {
            debug!("Discarding late {:?} result for {} (generation {})", kind, sport_key, generation);
            return Ok(CycleOutcome::Superseded);
        }

        st.is_fetching = false;
        st.events_loading = false;

        match result {
            Ok(events) => {
                debug!("{:?} cycle for {}: {} events", kind, sport_key, events.len());
                st.events = events;
                st.clear_error();
                st.last_updated = Some(Utc::now());
                st.phase = SyncPhase::Steady;
                st.is_polling = true;
                // Ticks run inside the existing timer task
                if kind != CycleKind::Poll {
                    self.arm_timer(&mut st, generation);
                }
                self.publish(&st);
                Ok(CycleOutcome::Published)
            }
            Err(err) => {
                warn!("Suspending polling for {}: {}", sport_key, err);
                st.suspend(kind.error_context(), err.clone());
                self.publish(&st);
                Err(err)
            }
        }
    }

    /// Replace any existing timer with a fresh one for `generation`
    fn arm_timer(self: &Arc<Self>, st: &mut SessionState, generation: u64) {
        st.disarm();

        let weak: Weak<Inner> = Arc::downgrade(self);
        let period = self.poll_interval.max(Duration::from_millis(1));
        let join = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                if let TickControl::Stop = inner.tick(generation).await {
                    break;
                }
            }
        });

        st.poll_handle = Some(PollHandle::new(join));
        debug!("Poll timer armed every {:?} (generation {})", period, generation);
    }

    async fn tick(self: &Arc<Self>, generation: u64) -> TickControl {
        let sport_key = {
            let mut st = self.lock();
            if st.generation != generation || !st.is_polling {
                return TickControl::Stop;
            }
            let Some(sport_key) = st.selected_sport.clone() else {
                return TickControl::Stop;
            };
            if st.is_fetching {
                debug!("Tick skipped, fetch already in flight for {}", sport_key);
                return TickControl::Continue;
            }
            st.is_fetching = true;
            st.phase = SyncPhase::Refreshing;
            self.publish(&st);
            sport_key
        };

        match self.run_cycle(generation, &sport_key, CycleKind::Poll).await {
            Ok(_) => TickControl::Continue,
            Err(_) => TickControl::Stop,
        }
    }
}

/// Fetch odds and scores jointly; both settle before either result is used
async fn fetch_events(
    upstream: &dyn Upstream,
    sport_key: &str,
) -> Result<Vec<CanonicalEvent>, SyncError> {
    let (odds, scores) = join(upstream.odds(sport_key), upstream.scores(sport_key)).await;
    let odds = odds?;
    let scores = scores?;
    Ok(reconcile::merge(&odds, &scores))
}
