//! Tokio driver for the distraction state machine.
//!
//! `start`, `stop` and `submit_answer` return immediately. Arming a delay spawns
//! one sleeping task on the runtime captured at construction; when it wakes it
//! fires its ticket, which the state machine ignores if the delay was cancelled
//! in the meantime. Timer tasks only hold a weak reference, so dropping the
//! last scheduler handle aborts the pending sleep.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use workshop_core::distraction::{AnswerOutcome, DelayTicket, DistractionState};
use workshop_core::model::Problem;
use workshop_core::pools::ProblemPool;

use crate::error::SchedulerError;

struct Inner {
    state: Mutex<DistractionState>,
    rng: Mutex<StdRng>,
    timer: Mutex<Option<JoinHandle<()>>>,
    pool: ProblemPool,
    delay: Duration,
    runtime: Handle,
}

/// Presents a problem after each quiet delay while active.
#[derive(Clone)]
pub struct DistractionScheduler {
    inner: Arc<Inner>,
}

// Poisoning is ignored: every critical section leaves the state consistent.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DistractionScheduler {
    /// Builds a scheduler bound to the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::NoRuntime` when called outside a runtime.
    pub fn new(pool: ProblemPool, delay: Duration, seed: u64) -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current()?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(DistractionState::new()),
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
                timer: Mutex::new(None),
                pool,
                delay,
                runtime,
            }),
        })
    }

    /// Activates the scheduler. Idempotent while active.
    pub fn start(&self) {
        let ticket = lock(&self.inner.state).start();
        if let Some(ticket) = ticket {
            debug!(epoch = ticket.epoch(), "distraction started");
            self.arm(ticket);
        }
    }

    /// Deactivates and cancels the armed delay. A pending problem stays.
    pub fn stop(&self) {
        lock(&self.inner.state).stop();
        self.abort_timer();
        debug!("distraction stopped");
    }

    /// Drops any problem and the score, and cancels the armed delay.
    pub fn reset(&self) {
        lock(&self.inner.state).reset();
        self.abort_timer();
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<Problem> {
        lock(&self.inner.state).pending().cloned()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.inner.state).pending().is_some()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        lock(&self.inner.state).score()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.inner.state).is_active()
    }

    /// Checks `text` against the pending problem, re-arming after a correct answer.
    pub fn submit_answer(&self, text: &str) -> AnswerOutcome {
        let result = lock(&self.inner.state).submit_answer(text);
        debug!(outcome = ?result.outcome, "distraction answer");
        if let Some(ticket) = result.rearm {
            self.arm(ticket);
        }
        result.outcome
    }

    fn arm(&self, ticket: DelayTicket) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.delay;
        let handle = self.inner.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.fire(ticket);
            }
        });
        if let Some(previous) = lock(&self.inner.timer).replace(handle) {
            previous.abort();
        }
    }

    fn abort_timer(&self) {
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
    }
}

impl Inner {
    fn fire(&self, ticket: DelayTicket) {
        let mut state = lock(&self.state);
        let mut rng = lock(&self.rng);
        match state.fire(ticket, &self.pool, &mut *rng) {
            Some(problem) => debug!(problem = %problem.id(), "distraction presented"),
            None => debug!(epoch = ticket.epoch(), "stale distraction delay ignored"),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
