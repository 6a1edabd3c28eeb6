//! Pure state machine behind the recurring distraction popups.
//!
//! The machine never sleeps. Arming a delay hands the caller a [`DelayTicket`];
//! whoever owns the timer calls [`DistractionState::fire`] with that ticket when
//! the delay elapses. Every arm and every cancel bumps an epoch counter, so a
//! ticket from a stopped or superseded delay is recognized as stale and ignored.

use rand::Rng;

use crate::model::Problem;
use crate::pools::ProblemPool;

/// Handle for one armed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayTicket {
    epoch: u64,
}

impl DelayTicket {
    #[must_use]
    pub fn epoch(self) -> u64 {
        self.epoch
    }
}

/// Outcome of answering the pending problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// There was no problem to answer.
    NothingPending,
}

/// What `submit_answer` did, plus the next delay to arm if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerResult {
    pub outcome: AnswerOutcome,
    pub rearm: Option<DelayTicket>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistractionState {
    active: bool,
    pending: Option<Problem>,
    score: u32,
    epoch: u64,
    armed: Option<u64>,
}

impl DistractionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn pending(&self) -> Option<&Problem> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Activates the scheduler. Returns a ticket only if a new delay must be armed;
    /// calling it again while a delay is armed or a problem is pending returns `None`.
    pub fn start(&mut self) -> Option<DelayTicket> {
        self.active = true;
        self.arm()
    }

    /// Deactivates and cancels any armed delay. A pending problem stays.
    pub fn stop(&mut self) {
        self.active = false;
        self.cancel();
    }

    /// Invalidates any armed delay. Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.armed = None;
    }

    /// Returns to a fresh inactive machine with no problem and zero score.
    ///
    /// The epoch keeps counting, so tickets handed out before the reset stay stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch;
        *self = Self {
            epoch,
            ..Self::default()
        };
        self.cancel();
    }

    fn arm(&mut self) -> Option<DelayTicket> {
        if !self.active || self.pending.is_some() || self.armed.is_some() {
            return None;
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.armed = Some(self.epoch);
        Some(DelayTicket { epoch: self.epoch })
    }

    /// True if `ticket` is still the live delay.
    #[must_use]
    pub fn is_current(&self, ticket: DelayTicket) -> bool {
        self.armed == Some(ticket.epoch) && self.epoch == ticket.epoch
    }

    /// Delay elapsed: draws a problem if the ticket is still current.
    ///
    /// Returns `None` for stale tickets.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        ticket: DelayTicket,
        pool: &ProblemPool,
        rng: &mut R,
    ) -> Option<&Problem> {
        if !self.is_current(ticket) || !self.active || self.pending.is_some() {
            return None;
        }
        self.armed = None;
        self.pending = Some(pool.draw(rng).clone());
        self.pending.as_ref()
    }

    /// Checks `text` against the pending problem.
    ///
    /// A correct answer scores a point, clears the problem and, while active,
    /// asks for the next delay. A wrong answer changes nothing.
    pub fn submit_answer(&mut self, text: &str) -> AnswerResult {
        let Some(problem) = self.pending.as_ref() else {
            return AnswerResult {
                outcome: AnswerOutcome::NothingPending,
                rearm: None,
            };
        };
        if !problem.accepts(text) {
            return AnswerResult {
                outcome: AnswerOutcome::Incorrect,
                rearm: None,
            };
        }
        self.pending = None;
        self.score = self.score.saturating_add(1);
        AnswerResult {
            outcome: AnswerOutcome::Correct,
            rearm: self.arm(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn fired(state: &mut DistractionState, ticket: DelayTicket) -> Problem {
        state
            .fire(ticket, &ProblemPool::builtin(), &mut rng())
            .cloned()
            .expect("ticket should be current")
    }

    #[test]
    fn start_is_idempotent() {
        let mut state = DistractionState::new();
        let ticket = state.start();
        assert!(ticket.is_some());
        assert!(state.start().is_none());
        assert!(state.start().is_none());
        assert!(state.is_armed());
    }

    #[test]
    fn correct_answer_scores_and_rearms() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        let problem = fired(&mut state, ticket);
        assert!(!state.is_armed());

        let answer = format!("  {}  ", problem.expected_answer().to_uppercase());
        let result = state.submit_answer(&answer);
        assert_eq!(result.outcome, AnswerOutcome::Correct);
        assert!(result.rearm.is_some());
        assert_eq!(state.score(), 1);
        assert!(state.pending().is_none());
    }

    #[test]
    fn wrong_answer_keeps_problem() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        let problem = fired(&mut state, ticket);

        let result = state.submit_answer("wrong");
        assert_eq!(result.outcome, AnswerOutcome::Incorrect);
        assert!(result.rearm.is_none());
        assert_eq!(state.pending(), Some(&problem));
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn no_new_delay_while_pending() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        fired(&mut state, ticket);
        assert!(state.start().is_none());
        assert!(!state.is_armed());
        // A duplicate fire of the consumed ticket is ignored.
        assert!(state.fire(ticket, &ProblemPool::builtin(), &mut rng()).is_none());
    }

    #[test]
    fn stop_invalidates_armed_ticket() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        state.stop();
        assert!(state.fire(ticket, &ProblemPool::builtin(), &mut rng()).is_none());
        assert!(state.pending().is_none());

        // Restarting hands out a fresh ticket; the old one stays dead.
        let fresh = state.start().unwrap();
        assert_ne!(fresh, ticket);
        assert!(state.fire(ticket, &ProblemPool::builtin(), &mut rng()).is_none());
        assert!(state.fire(fresh, &ProblemPool::builtin(), &mut rng()).is_some());
    }

    #[test]
    fn stop_keeps_pending_and_correct_answer_does_not_rearm() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        let problem = fired(&mut state, ticket);
        state.stop();
        assert_eq!(state.pending(), Some(&problem));

        let result = state.submit_answer(problem.expected_answer());
        assert_eq!(result.outcome, AnswerOutcome::Correct);
        assert!(result.rearm.is_none());
        assert_eq!(state.score(), 1);
    }

    #[test]
    fn answer_without_problem_is_a_noop() {
        let mut state = DistractionState::new();
        state.start();
        let result = state.submit_answer("105");
        assert_eq!(result.outcome, AnswerOutcome::NothingPending);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn reset_clears_score_and_outlives_old_tickets() {
        let mut state = DistractionState::new();
        let ticket = state.start().unwrap();
        let problem = fired(&mut state, ticket);
        let stale = state.submit_answer(problem.expected_answer()).rearm.unwrap();

        state.reset();
        assert!(!state.is_active());
        assert!(state.pending().is_none());
        assert_eq!(state.score(), 0);

        let fresh = state.start().unwrap();
        assert!(fresh.epoch() > stale.epoch());
        assert!(state.fire(stale, &ProblemPool::builtin(), &mut rng()).is_none());
    }

    #[test]
    fn cancel_without_armed_delay_is_safe() {
        let mut state = DistractionState::new();
        state.cancel();
        state.stop();
        assert!(!state.is_active());
        assert!(!state.is_armed());
    }

    #[test]
    fn at_most_one_pending_under_interleaving() {
        let pool = ProblemPool::builtin();
        let mut rng = rng();
        let mut state = DistractionState::new();
        let mut tickets = Vec::new();

        for step in 0..200_u32 {
            match step % 5 {
                0 => tickets.extend(state.start()),
                1 => {
                    if let Some(t) = tickets.pop() {
                        state.fire(t, &pool, &mut rng);
                    }
                }
                2 => {
                    let answer = state
                        .pending()
                        .filter(|_| step % 3 == 0)
                        .map(|p| p.expected_answer().to_string())
                        .unwrap_or_else(|| "wrong".into());
                    tickets.extend(state.submit_answer(&answer).rearm);
                }
                3 if step % 7 == 0 => state.stop(),
                _ => {
                    for t in tickets.clone() {
                        state.fire(t, &pool, &mut rng);
                    }
                }
            }
            assert!(!(state.pending().is_some() && state.is_armed()));
        }
    }
}
