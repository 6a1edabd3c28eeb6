use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use workshop_core::distraction::AnswerOutcome;
use workshop_core::gate::SectionGate;
use workshop_core::model::{
    CapturedSecret, CompletionEvent, Problem, RecordedSecret, RunId, Section, SectionId, Session,
    SessionRecord, Stage, WorkshopPlan, WorkshopSettings,
};
use workshop_core::pools::{PassphrasePool, ProblemPool};

use crate::Clock;
use crate::distraction::DistractionScheduler;
use crate::error::SessionError;

/// Result of submitting a secret for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Accepted,
    Rejected,
    /// A distraction problem is waiting; the secret was not looked at.
    Blocked,
}

/// Completed versus total sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub fn remaining(self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

struct ActiveRun {
    session: Session,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    events: Vec<CompletionEvent>,
    distraction_score: Option<u32>,
    record_id: Option<i64>,
}

/// Drives one learner through the ordered sections.
///
/// Owns the session, the distraction scheduler and the resolved secrets. Randomized
/// secrets are only reachable through [`SessionController::secret_for`].
pub struct SessionController {
    plan: WorkshopPlan,
    passphrases: PassphrasePool,
    settings: WorkshopSettings,
    clock: Clock,
    gate: SectionGate,
    scheduler: DistractionScheduler,
    /// Draws the secret seed of each run; reseeded only in `new`.
    secret_rng: StdRng,
    run: Option<ActiveRun>,
}

impl SessionController {
    /// Builds a controller in the `Intro` stage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Scheduler` when no Tokio runtime is available.
    pub fn new(
        plan: WorkshopPlan,
        passphrases: PassphrasePool,
        problems: ProblemPool,
        settings: WorkshopSettings,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let scheduler_seed = settings
            .secret_seed()
            .map_or_else(|| rand::rng().random(), |seed| seed.rotate_left(17));
        let scheduler =
            DistractionScheduler::new(problems, settings.distraction_delay(), scheduler_seed)?;
        let secret_rng = StdRng::seed_from_u64(
            settings
                .secret_seed()
                .unwrap_or_else(|| rand::rng().random()),
        );
        Ok(Self {
            plan,
            passphrases,
            settings,
            clock,
            gate: SectionGate::new(),
            scheduler,
            secret_rng,
            run: None,
        })
    }

    /// Leaves the intro and enters the first section, resolving pooled secrets.
    ///
    /// Every run draws fresh pooled secrets; a configured seed makes the sequence
    /// of runs reproducible. Starting again while a run is in progress discards it first.
    pub fn start(&mut self) -> RunId {
        if self.run.is_some() {
            self.reset();
        }
        let seed = self.secret_rng.random();
        let run_id = RunId::generate();
        let session = Session::start(run_id, &self.plan, &self.passphrases, seed);
        self.run = Some(ActiveRun {
            session,
            started_at: self.clock.now(),
            completed_at: None,
            events: Vec::new(),
            distraction_score: None,
            record_id: None,
        });
        info!(%run_id, sections = self.plan.len(), "workshop started");
        self.enter_current();
        run_id
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        match &self.run {
            None => Stage::Intro,
            Some(run) if run.session.is_complete() => Stage::Complete,
            Some(run) => Stage::Section(run.session.current_index()),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        self.run.as_ref().map(|r| r.session.run_id())
    }

    /// Resolved sections of the current run; empty before `start`.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        self.run
            .as_ref()
            .map(|r| r.session.sections())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.run.as_ref().and_then(|r| r.session.current_section())
    }

    /// True for the first section and for any section whose predecessor is completed.
    #[must_use]
    pub fn is_unlocked(&self, id: &SectionId) -> bool {
        self.run
            .as_ref()
            .is_some_and(|r| r.session.is_unlocked(id))
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.run.as_ref().is_some_and(|r| r.session.is_complete())
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        match &self.run {
            None => Progress {
                completed: 0,
                total: self.plan.len(),
            },
            Some(run) => Progress {
                completed: run.session.completed().len(),
                total: run.session.sections().len(),
            },
        }
    }

    #[must_use]
    pub fn secret_for(&self, id: &SectionId) -> Option<&str> {
        self.run
            .as_ref()
            .and_then(|r| r.session.section(id))
            .map(Section::secret)
    }

    #[must_use]
    pub fn captured_secrets(&self) -> &[CapturedSecret] {
        self.run
            .as_ref()
            .map(|r| r.session.captured())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn completion_events(&self) -> &[CompletionEvent] {
        self.run
            .as_ref()
            .map(|r| r.events.as_slice())
            .unwrap_or_default()
    }

    /// Submits `text` as the secret of section `id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when no run is active, the run is complete, or `id`
    /// is unknown or not the current section. Errors leave the session untouched.
    pub fn advance(&mut self, id: &SectionId, text: &str) -> Result<AdvanceOutcome, SessionError> {
        self.advance_recorded(id, text).map(|(outcome, _)| outcome)
    }

    pub(crate) fn advance_recorded(
        &mut self,
        id: &SectionId,
        text: &str,
    ) -> Result<(AdvanceOutcome, Option<CompletionEvent>), SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NotStarted)?;
        if run.session.position(id).is_none() {
            return Err(SessionError::UnknownSection(id.clone()));
        }
        let current = run
            .session
            .current_section()
            .ok_or(SessionError::Completed)?;
        if current.id() != id {
            return Err(SessionError::NotCurrent {
                expected: current.id().clone(),
                got: id.clone(),
            });
        }

        let requires_distraction = current.requires_distraction();
        if requires_distraction && self.scheduler.has_pending() {
            debug!(section = %id, "submission blocked by pending distraction");
            return Ok((AdvanceOutcome::Blocked, None));
        }
        if !self.gate.validate(current, text).is_accepted() {
            debug!(section = %id, "secret rejected");
            return Ok((AdvanceOutcome::Rejected, None));
        }
        let secret = current.secret().to_string();

        let distraction_score = if requires_distraction {
            self.scheduler.stop();
            Some(self.scheduler.score())
        } else {
            None
        };
        run.session.complete_current(id, secret.clone())?;

        let now = self.clock.now();
        let event = CompletionEvent {
            run_id: run.session.run_id(),
            section_id: id.clone(),
            captured_secret: secret,
            distraction_score,
            completed_at: now,
        };
        run.events.push(event.clone());
        if distraction_score.is_some() {
            run.distraction_score = distraction_score;
        }
        info!(
            run_id = %event.run_id,
            section = %id,
            completed = run.session.completed().len(),
            "section completed"
        );

        if run.session.is_complete() {
            run.completed_at = Some(now);
            info!(run_id = %event.run_id, "workshop complete");
        } else {
            self.enter_current();
        }
        Ok((AdvanceOutcome::Accepted, Some(event)))
    }

    /// Back to the intro. Clears every captured secret and cancels any armed delay.
    pub fn reset(&mut self) {
        self.scheduler.reset();
        if let Some(run) = self.run.take() {
            info!(run_id = %run.session.run_id(), "workshop reset");
        }
    }

    /// Starts the distraction scheduler for the current section.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` or `SessionError::Completed` outside a
    /// section, and `SessionError::NoDistraction` if the current section has none.
    pub fn start_distraction(&self) -> Result<(), SessionError> {
        let section = self.require_current()?;
        if !section.requires_distraction() {
            return Err(SessionError::NoDistraction(section.id().clone()));
        }
        self.scheduler.start();
        Ok(())
    }

    /// Stops the distraction scheduler. Any pending problem stays.
    pub fn stop_distraction(&self) {
        self.scheduler.stop();
    }

    pub fn submit_distraction_answer(&self, text: &str) -> AnswerOutcome {
        self.scheduler.submit_answer(text)
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<Problem> {
        self.scheduler.current_problem()
    }

    #[must_use]
    pub fn distraction_score(&self) -> u32 {
        self.scheduler.score()
    }

    #[must_use]
    pub fn distraction_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Aggregate record of a completed run.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start` and
    /// `SessionError::Incomplete` while sections remain.
    pub fn session_record(&self) -> Result<SessionRecord, SessionError> {
        let run = self.run.as_ref().ok_or(SessionError::NotStarted)?;
        let completed_at = run.completed_at.ok_or(SessionError::Incomplete)?;
        let secrets = run
            .session
            .captured()
            .iter()
            .map(RecordedSecret::from)
            .collect();
        Ok(SessionRecord::new(
            run.session.run_id(),
            run.started_at,
            completed_at,
            secrets,
            run.distraction_score.unwrap_or(0),
        )?)
    }

    #[must_use]
    pub fn record_id(&self) -> Option<i64> {
        self.run.as_ref().and_then(|r| r.record_id)
    }

    pub(crate) fn set_record_id(&mut self, id: i64) {
        if let Some(run) = self.run.as_mut() {
            run.record_id = Some(id);
        }
    }

    fn require_current(&self) -> Result<&Section, SessionError> {
        let run = self.run.as_ref().ok_or(SessionError::NotStarted)?;
        run.session.current_section().ok_or(SessionError::Completed)
    }

    fn enter_current(&self) {
        let Some(section) = self.current_section() else {
            return;
        };
        debug!(section = %section.id(), "entered section");
        if section.requires_distraction() && self.settings.auto_start_distraction() {
            self.scheduler.start();
        }
    }
}
