//! Passphrase validation for challenge sections.

use crate::model::Section;

/// Result of checking a submitted passphrase against a section's secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Compares two answers ignoring surrounding whitespace and letter case.
#[must_use]
pub fn answers_match(expected: &str, submitted: &str) -> bool {
    let expected = expected.trim();
    let submitted = submitted.trim();
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    expected.to_lowercase() == submitted.to_lowercase()
}

/// Stateless passphrase checker.
///
/// There is no lockout: a rejected attempt has no side effect, so callers may
/// retry as often as they like.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionGate;

impl SectionGate {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn validate(&self, section: &Section, submitted: &str) -> Verdict {
        if answers_match(section.secret(), submitted) {
            Verdict::Accepted
        } else {
            Verdict::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SectionId, SectionTemplate};

    fn hearing() -> Section {
        Section::from_template(
            &SectionTemplate::fixed("hearing", "Hearing", "BANANA").unwrap(),
            "BANANA".to_string(),
        )
    }

    #[test]
    fn accepts_any_case_and_padding() {
        let gate = SectionGate::new();
        let section = hearing();
        for attempt in ["banana", "BANANA", " Banana ", "\tbAnAnA\n"] {
            assert_eq!(gate.validate(&section, attempt), Verdict::Accepted, "{attempt:?}");
        }
    }

    #[test]
    fn rejects_wrong_or_blank() {
        let gate = SectionGate::new();
        let section = hearing();
        assert_eq!(gate.validate(&section, "bananas"), Verdict::Rejected);
        assert_eq!(gate.validate(&section, ""), Verdict::Rejected);
        assert_eq!(gate.validate(&section, "   "), Verdict::Rejected);
        assert_eq!(section.id(), &SectionId::new("hearing"));
    }

    #[test]
    fn inner_whitespace_is_significant() {
        assert!(!answers_match("trust no1", "trustno1"));
        assert!(answers_match("Trust No1", " trust no1"));
    }
}
