use std::sync::Arc;

use tracing::{info, warn};

use storage::repository::CompletionRepository;
use workshop_core::distraction::AnswerOutcome;
use workshop_core::model::{SectionId, WorkshopPlan, WorkshopSettings};
use workshop_core::pools::{PassphrasePool, ProblemPool};

use super::controller::{AdvanceOutcome, SessionController};
use crate::Clock;
use crate::error::SessionError;

/// Whether the record store took what a submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Nothing to store: the secret was rejected or blocked.
    NotNeeded,
    Stored,
    /// The store refused; session progress stands regardless.
    Failed(String),
}

/// Result of submitting a section secret through the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub outcome: AdvanceOutcome,
    pub persistence: PersistenceStatus,
    pub is_complete: bool,
    pub record_id: Option<i64>,
}

/// Orchestrates workshop runs and hands their results to the record store.
#[derive(Clone)]
pub struct WorkshopService {
    clock: Clock,
    settings: WorkshopSettings,
    plan: WorkshopPlan,
    passphrases: PassphrasePool,
    problems: ProblemPool,
    completions: Arc<dyn CompletionRepository>,
}

impl WorkshopService {
    #[must_use]
    pub fn new(clock: Clock, completions: Arc<dyn CompletionRepository>) -> Self {
        Self {
            clock,
            settings: WorkshopSettings::default(),
            plan: WorkshopPlan::accessibility(),
            passphrases: PassphrasePool::builtin(),
            problems: ProblemPool::builtin(),
            completions,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: WorkshopSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_plan(mut self, plan: WorkshopPlan) -> Self {
        self.plan = plan;
        self
    }

    #[must_use]
    pub fn with_passphrases(mut self, passphrases: PassphrasePool) -> Self {
        self.passphrases = passphrases;
        self
    }

    #[must_use]
    pub fn with_problems(mut self, problems: ProblemPool) -> Self {
        self.problems = problems;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &WorkshopSettings {
        &self.settings
    }

    /// Start a new run at its first section.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Scheduler` outside a Tokio runtime.
    pub fn start_session(&self) -> Result<SessionController, SessionError> {
        let mut controller = SessionController::new(
            self.plan.clone(),
            self.passphrases.clone(),
            self.problems.clone(),
            self.settings.clone(),
            self.clock,
        )?;
        controller.start();
        Ok(controller)
    }

    /// Submit a secret and persist the completion event, plus the session
    /// record once the last section is accepted.
    ///
    /// Storage failures are reported in the result and never undo progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for caller errors (no run, wrong or unknown section).
    pub async fn submit_secret(
        &self,
        controller: &mut SessionController,
        section_id: &SectionId,
        text: &str,
    ) -> Result<SubmitResult, SessionError> {
        let (outcome, event) = controller.advance_recorded(section_id, text)?;
        let Some(event) = event else {
            return Ok(SubmitResult {
                outcome,
                persistence: PersistenceStatus::NotNeeded,
                is_complete: controller.is_complete(),
                record_id: controller.record_id(),
            });
        };

        let mut persistence = match self.completions.append_completion(&event).await {
            Ok(_) => PersistenceStatus::Stored,
            Err(err) => {
                warn!(
                    run_id = %event.run_id,
                    section = %section_id,
                    error = %err,
                    "completion not stored"
                );
                PersistenceStatus::Failed(err.to_string())
            }
        };

        if controller.is_complete() && controller.record_id().is_none() {
            if let Err(err) = self.finalize_record(controller).await {
                warn!(run_id = %event.run_id, error = %err, "session record not stored");
                if persistence == PersistenceStatus::Stored {
                    persistence = PersistenceStatus::Failed(err.to_string());
                }
            }
        }

        Ok(SubmitResult {
            outcome,
            persistence,
            is_complete: controller.is_complete(),
            record_id: controller.record_id(),
        })
    }

    /// # Errors
    ///
    /// See [`SessionController::start_distraction`].
    pub fn start_distraction(&self, controller: &SessionController) -> Result<(), SessionError> {
        controller.start_distraction()
    }

    pub fn stop_distraction(&self, controller: &SessionController) {
        controller.stop_distraction();
    }

    pub fn submit_distraction_answer(
        &self,
        controller: &SessionController,
        text: &str,
    ) -> AnswerOutcome {
        controller.submit_distraction_answer(text)
    }

    pub fn reset_session(&self, controller: &mut SessionController) {
        controller.reset();
    }

    /// Append the session record of a completed run, or return the id it was
    /// already stored under. Use this to retry after a failed append.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` while sections remain and
    /// `SessionError::Storage` if persistence fails.
    pub async fn finalize_record(
        &self,
        controller: &mut SessionController,
    ) -> Result<i64, SessionError> {
        if let Some(id) = controller.record_id() {
            return Ok(id);
        }

        let record = controller.session_record()?;
        let id = self.completions.append_session_record(&record).await?;
        controller.set_record_id(id);
        info!(run_id = %record.run_id(), record_id = id, "session record stored");
        Ok(id)
    }
}
