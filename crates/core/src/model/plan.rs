use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::SectionId;
use crate::model::section::{SecretSource, SectionTemplate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanError {
    #[error("a workshop needs at least one section")]
    NoSections,

    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),

    #[error("only one section may require the distraction scheduler (found {found})")]
    TooManyDistractionSections { found: usize },
}

/// Ordered, validated list of section templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopPlan {
    sections: Vec<SectionTemplate>,
}

impl WorkshopPlan {
    /// # Errors
    ///
    /// Returns `PlanError` if the list is empty, repeats an id, or marks more
    /// than one section as distraction-gated.
    pub fn new(sections: Vec<SectionTemplate>) -> Result<Self, PlanError> {
        if sections.is_empty() {
            return Err(PlanError::NoSections);
        }
        let mut seen = HashSet::new();
        for s in &sections {
            if !seen.insert(s.id().clone()) {
                return Err(PlanError::DuplicateSection(s.id().clone()));
            }
        }
        let found = sections.iter().filter(|s| s.requires_distraction()).count();
        if found > 1 {
            return Err(PlanError::TooManyDistractionSections { found });
        }
        Ok(Self { sections })
    }

    /// The four-part accessibility workshop: hearing, vision, motor, cognitive.
    ///
    /// # Panics
    ///
    /// Panics if the built-in templates fail validation.
    #[must_use]
    pub fn accessibility() -> Self {
        let sections = vec![
            SectionTemplate::fixed("hearing", "Hearing Challenge", "BANANA")
                .expect("valid built-in section"),
            SectionTemplate::pooled("vision", "Vision Challenge").expect("valid built-in section"),
            SectionTemplate::pooled("motor", "Motor Challenge").expect("valid built-in section"),
            SectionTemplate::fixed("cognitive", "Cognitive Challenge", "FOCUS")
                .expect("valid built-in section")
                .with_distraction(),
        ];
        Self { sections }
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionTemplate] {
        &self.sections
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// True if any section draws its secret from the passphrase pool.
    #[must_use]
    pub fn uses_pool(&self) -> bool {
        self.sections
            .iter()
            .any(|s| matches!(s.source(), SecretSource::Pool))
    }
}

impl Default for WorkshopPlan {
    fn default() -> Self {
        Self::accessibility()
    }
}
