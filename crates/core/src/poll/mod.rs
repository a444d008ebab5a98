//! Fixed-interval polling engine.
//!
//! The PollingEngine drives repeated async probes against the backend until a
//! caller-supplied predicate says the observed value is final, the attempt
//! budget runs out, or the session is stopped. It owns all of its session
//! state; callers interact with it only through `run` and `stop`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

/// How often to probe and for how long to keep trying.
///
/// The total time a session can spend is not stored anywhere; it follows from
/// the two fields as `interval * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Delay between one probe resolving and the next one starting.
    pub interval: Duration,
    /// Maximum number of probe invocations per session.
    pub max_attempts: u32,
}

impl PollBudget {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on how long a session keeps probing.
    pub fn effective_timeout(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Successful session result: the final probed value and how many probes it
/// took to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome<T> {
    pub value: T,
    pub attempts: u32,
}

/// Why a session ended without a final value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError<E> {
    /// The attempt budget ran out before the predicate was satisfied.
    #[error("polling timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// A probe failed. One failure ends the session; there is no transport
    /// retry inside the engine.
    #[error("poll probe failed: {0}")]
    Probe(E),

    /// The session was stopped or replaced by a newer one. Nothing about it
    /// reached shared state.
    #[error("poll session superseded")]
    Superseded,
}

/// Reusable fixed-interval poller.
///
/// At most one session is current per engine. Starting a new session while an
/// old one is still running invalidates the old one: it wakes, notices its
/// generation no longer matches and exits without touching anything. `stop`
/// works the same way, so a stopped session can neither probe again nor
/// deliver a stale result.
pub struct PollingEngine {
    budget: PollBudget,
    generation: AtomicU64,
    attempts: AtomicU32,
    active: AtomicBool,
    stop_signal: Notify,
}

impl PollingEngine {
    pub fn new(budget: PollBudget) -> Self {
        Self {
            budget,
            generation: AtomicU64::new(0),
            attempts: AtomicU32::new(0),
            active: AtomicBool::new(false),
            stop_signal: Notify::new(),
        }
    }

    pub fn budget(&self) -> PollBudget {
        self.budget
    }

    /// Probe count observed for the most recent session. Diagnostic only;
    /// budget decisions use session-local state.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Whether a session is currently probing or sleeping.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run one poll session to completion.
    ///
    /// The first probe fires immediately; subsequent probes wait `interval`
    /// between one resolving and the next starting. The budget is checked
    /// before each probe, so the probe runs at most `max_attempts` times.
    ///
    /// # Arguments
    ///
    /// * `probe` - Async operation producing the next observation
    /// * `is_done` - Predicate deciding whether an observation is final
    ///
    /// # Errors
    ///
    /// - `PollError::Timeout` when the budget runs out
    /// - `PollError::Probe` when a probe fails (the session ends immediately)
    /// - `PollError::Superseded` when `stop` was called or another session
    ///   started while this one was waiting or probing
    pub async fn run<T, E, P, Fut, D>(
        &self,
        mut probe: P,
        is_done: D,
    ) -> Result<PollOutcome<T>, PollError<E>>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: Fn(&T) -> bool,
    {
        let session = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Wake any sleeping predecessor so it can notice it was replaced.
        self.stop_signal.notify_waiters();
        self.attempts.store(0, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        debug!(session, max_attempts = self.budget.max_attempts, "poll session started");

        let mut attempts: u32 = 0;
        loop {
            if self.generation.load(Ordering::SeqCst) != session {
                return Err(PollError::Superseded);
            }
            if attempts >= self.budget.max_attempts {
                self.finish(session);
                debug!(session, attempts, "poll session exhausted its budget");
                return Err(PollError::Timeout { attempts });
            }

            let result = probe().await;

            // A stop/restart that landed while the probe was in flight wins:
            // the observation is discarded, whatever it was.
            if self.generation.load(Ordering::SeqCst) != session {
                return Err(PollError::Superseded);
            }

            let value = match result {
                Ok(value) => value,
                Err(e) => {
                    self.finish(session);
                    return Err(PollError::Probe(e));
                }
            };

            attempts += 1;
            self.attempts.store(attempts, Ordering::SeqCst);

            if is_done(&value) {
                self.finish(session);
                debug!(session, attempts, "poll session finished");
                return Ok(PollOutcome { value, attempts });
            }

            tokio::select! {
                _ = tokio::time::sleep(self.budget.interval) => {}
                _ = self.stop_signal.notified() => {}
            }
        }
    }

    /// Stop the current session, if any.
    ///
    /// Idempotent: stopping an idle engine is a no-op, and repeated calls are
    /// harmless. Any sleeping session wakes immediately and exits with
    /// `Superseded`.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        self.stop_signal.notify_waiters();
    }

    fn finish(&self, session: u64) {
        // Only the current session may declare the engine idle.
        if self.generation.load(Ordering::SeqCst) == session {
            self.active.store(false, Ordering::SeqCst);
        }
    }
}
