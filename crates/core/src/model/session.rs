use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::model::ids::{RunId, SectionId};
use crate::model::plan::WorkshopPlan;
use crate::model::section::{SecretSource, Section};
use crate::pools::PassphrasePool;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("unknown section: {0}")]
    UnknownSection(SectionId),

    #[error("section {got} is not the current section (expected {expected})")]
    NotCurrent { expected: SectionId, got: SectionId },

    #[error("all sections are already completed")]
    AllCompleted,
}

/// Where a workshop run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intro,
    Section(usize),
    Complete,
}

/// A passphrase accepted for a section, in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSecret {
    pub section_id: SectionId,
    pub secret: String,
}

/// Resolves every template's secret for one run.
///
/// Pure in `seed`: the same plan, pool and seed always give the same secrets.
#[must_use]
pub fn resolve_sections(plan: &WorkshopPlan, pool: &PassphrasePool, seed: u64) -> Vec<Section> {
    let mut rng = StdRng::seed_from_u64(seed);
    plan.sections()
        .iter()
        .map(|template| {
            let secret = match template.source() {
                SecretSource::Fixed(secret) => secret.clone(),
                SecretSource::Pool => pool.draw(&mut rng),
            };
            Section::from_template(template, secret)
        })
        .collect()
}

/// Linear progress through the sections of one run.
///
/// `completed` is always a prefix of `sections`, so the current index is just
/// its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    run_id: RunId,
    sections: Vec<Section>,
    completed: Vec<SectionId>,
    captured: Vec<CapturedSecret>,
}

impl Session {
    #[must_use]
    pub fn new(run_id: RunId, sections: Vec<Section>) -> Self {
        Self {
            run_id,
            sections,
            completed: Vec::new(),
            captured: Vec::new(),
        }
    }

    /// Start a run from a plan, drawing pooled secrets from `seed`.
    #[must_use]
    pub fn start(run_id: RunId, plan: &WorkshopPlan, pool: &PassphrasePool, seed: u64) -> Self {
        Self::new(run_id, resolve_sections(plan, pool, seed))
    }

    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }

    #[must_use]
    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id() == id)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.sections.get(self.current_index())
    }

    #[must_use]
    pub fn completed(&self) -> &[SectionId] {
        &self.completed
    }

    #[must_use]
    pub fn captured(&self) -> &[CapturedSecret] {
        &self.captured
    }

    #[must_use]
    pub fn captured_secret(&self, id: &SectionId) -> Option<&str> {
        self.captured
            .iter()
            .find(|c| &c.section_id == id)
            .map(|c| c.secret.as_str())
    }

    #[must_use]
    pub fn is_completed(&self, id: &SectionId) -> bool {
        self.completed.contains(id)
    }

    /// True for the first section, or when the section right before it is completed.
    #[must_use]
    pub fn is_unlocked(&self, id: &SectionId) -> bool {
        match self.position(id) {
            Some(0) => true,
            Some(idx) => self.is_completed(self.sections[idx - 1].id()),
            None => false,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() == self.sections.len()
    }

    /// Marks the current section as completed with the accepted secret.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` if `id` is unknown, is not the current
    /// section, or every section is already done.
    pub fn complete_current(
        &mut self,
        id: &SectionId,
        secret: impl Into<String>,
    ) -> Result<(), SessionStateError> {
        if self.position(id).is_none() {
            return Err(SessionStateError::UnknownSection(id.clone()));
        }
        let Some(current) = self.current_section() else {
            return Err(SessionStateError::AllCompleted);
        };
        if current.id() != id {
            return Err(SessionStateError::NotCurrent {
                expected: current.id().clone(),
                got: id.clone(),
            });
        }
        self.completed.push(id.clone());
        self.captured.push(CapturedSecret {
            section_id: id.clone(),
            secret: secret.into(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionTemplate;

    fn plan() -> WorkshopPlan {
        WorkshopPlan::new(vec![
            SectionTemplate::fixed("a", "A", "ALPHA").unwrap(),
            SectionTemplate::pooled("b", "B").unwrap(),
            SectionTemplate::fixed("c", "C", "GAMMA").unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn resolving_is_deterministic_per_seed() {
        let pool = PassphrasePool::builtin();
        let first = resolve_sections(&plan(), &pool, 99);
        let again = resolve_sections(&plan(), &pool, 99);
        assert_eq!(first, again);
        assert_eq!(first[0].secret(), "ALPHA");
        assert!(pool.contains(first[1].secret()));
    }

    #[test]
    fn unlocks_follow_completion_prefix() {
        let mut session = Session::start(RunId::generate(), &plan(), &PassphrasePool::builtin(), 1);
        let (a, b, c) = (SectionId::new("a"), SectionId::new("b"), SectionId::new("c"));

        assert!(session.is_unlocked(&a));
        assert!(!session.is_unlocked(&b));
        assert!(!session.is_unlocked(&c));
        assert!(!session.is_unlocked(&SectionId::new("zzz")));

        session.complete_current(&a, "alpha").unwrap();
        assert!(session.is_unlocked(&b));
        assert!(!session.is_unlocked(&c));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.captured_secret(&a), Some("alpha"));
    }

    #[test]
    fn completing_out_of_order_is_refused() {
        let mut session = Session::start(RunId::generate(), &plan(), &PassphrasePool::builtin(), 1);
        let err = session
            .complete_current(&SectionId::new("c"), "GAMMA")
            .unwrap_err();
        assert!(matches!(err, SessionStateError::NotCurrent { .. }));
        assert!(session.completed().is_empty());

        let err = session
            .complete_current(&SectionId::new("nope"), "x")
            .unwrap_err();
        assert_eq!(err, SessionStateError::UnknownSection(SectionId::new("nope")));
    }

    #[test]
    fn completes_after_last_section() {
        let mut session = Session::start(RunId::generate(), &plan(), &PassphrasePool::builtin(), 3);
        for id in ["a", "b", "c"] {
            session.complete_current(&SectionId::new(id), id).unwrap();
        }
        assert!(session.is_complete());
        assert!(session.current_section().is_none());
        assert_eq!(
            session.complete_current(&SectionId::new("a"), "a").unwrap_err(),
            SessionStateError::AllCompleted
        );
    }
}
