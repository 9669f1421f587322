//! Update coordinator
//!
//! Owns the single recurring fetch-and-broadcast cycle: refresh the token
//! pair when it has expired, persist the fresh pair, pull controller state
//! and pulse the dispatcher. Cycles are strictly serialized and rate-limited
//! by an explicit last-run guard.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::auth::store::TokenStore;
use crate::bus::dispatcher::Dispatcher;
use crate::errors::BridgeError;
use crate::session::Session;

/// Minimum interval between two full update cycles
pub const MIN_TIME_BETWEEN_UPDATES: Duration = Duration::from_secs(30);

/// Result of one [`Updater::update_data`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The fetch succeeded and the update signal was broadcast
    Updated,
    /// The call landed inside the throttle window, nothing was done
    Skipped,
    /// The fetch failed, no signal was broadcast
    Failed,
}

/// Cycle bookkeeping, guarded by the cycle mutex
#[derive(Debug, Clone)]
struct CycleState {
    last_run: Option<Instant>,
    last_success_at: DateTime<Utc>,
    err_streak: u32,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            last_run: None,
            last_success_at: DateTime::<Utc>::MIN_UTC,
            err_streak: 0,
        }
    }
}

/// Update coordinator
pub struct Updater {
    session: Arc<dyn Session>,
    store: Arc<dyn TokenStore>,
    dispatcher: Dispatcher,
    min_interval: Duration,
    cycle: Mutex<CycleState>,
}

impl Updater {
    /// Create a coordinator with the default throttle window
    pub fn new(
        session: Arc<dyn Session>,
        store: Arc<dyn TokenStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            session,
            store,
            dispatcher,
            min_interval: MIN_TIME_BETWEEN_UPDATES,
            cycle: Mutex::new(CycleState::default()),
        }
    }

    /// Override the throttle window
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Run one update cycle.
    ///
    /// Holding the cycle lock for the whole call keeps cycles strictly
    /// sequential, broadcast included; the last-run guard turns early
    /// re-invocations into no-ops.
    pub async fn update_data(&self) -> UpdateOutcome {
        let mut cycle = self.cycle.lock().await;

        if let Some(last_run) = cycle.last_run {
            if last_run.elapsed() < self.min_interval {
                debug!("Update requested inside the throttle window, skipping");
                return UpdateOutcome::Skipped;
            }
        }

        let outcome = match self.run_cycle().await {
            Ok(()) => {
                cycle.last_success_at = Utc::now();
                cycle.err_streak = 0;
                let delivered = self.dispatcher.send();
                debug!("Update signal delivered to {} subscriber(s)", delivered);
                UpdateOutcome::Updated
            }
            Err(e) => {
                cycle.err_streak += 1;
                error!(
                    "Could not update controller data ({} consecutive failure(s)) - {}",
                    cycle.err_streak, e
                );
                UpdateOutcome::Failed
            }
        };

        cycle.last_run = Some(Instant::now());
        outcome
    }

    /// Refresh the pair if needed, then fetch controller state.
    ///
    /// A failed refresh is logged but does not short-circuit the fetch; the
    /// fetch then fails on authentication and reports the cycle failure. A
    /// failed persist is logged and the cycle continues, the session still
    /// holds the fresh pair.
    async fn run_cycle(&self) -> Result<(), BridgeError> {
        if self.session.is_token_expired().await {
            match self.session.refresh_access_token().await {
                Ok(pair) => {
                    if let Err(e) = self.store.save(&pair).await {
                        error!("Could not persist refreshed token pair - {}", e);
                    }
                }
                Err(e) => {
                    error!("Could not refresh access token - {}", e);
                }
            }
        }

        self.session.update_controllers().await
    }

    /// Timestamp of the last successful cycle
    pub async fn last_success_at(&self) -> DateTime<Utc> {
        self.cycle.lock().await.last_success_at
    }

    /// Number of consecutive failed cycles
    pub async fn consecutive_failures(&self) -> u32 {
        self.cycle.lock().await.err_streak
    }
}
