use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gate::answers_match;
use crate::model::ids::ProblemId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("problem question cannot be empty")]
    EmptyQuestion,

    #[error("problem answer cannot be empty")]
    EmptyAnswer,
}

/// Flavour of an interruption problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemKind {
    Math,
    Puzzle,
}

impl ProblemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::Math => "math",
            ProblemKind::Puzzle => "puzzle",
        }
    }
}

/// A single interruption challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    id: ProblemId,
    kind: ProblemKind,
    question: String,
    expected_answer: String,
}

impl Problem {
    /// # Errors
    ///
    /// Returns `ProblemError` if the question or answer is blank.
    pub fn new(
        id: ProblemId,
        kind: ProblemKind,
        question: impl Into<String>,
        expected_answer: impl Into<String>,
    ) -> Result<Self, ProblemError> {
        let question = question.into().trim().to_string();
        let expected_answer = expected_answer.into().trim().to_string();
        if question.is_empty() {
            return Err(ProblemError::EmptyQuestion);
        }
        if expected_answer.is_empty() {
            return Err(ProblemError::EmptyAnswer);
        }
        Ok(Self {
            id,
            kind,
            question,
            expected_answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProblemId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    /// True when `answer` matches the expected answer, ignoring case and padding.
    #[must_use]
    pub fn accepts(&self, answer: &str) -> bool {
        answers_match(&self.expected_answer, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_normalized_answer() {
        let p = Problem::new(
            ProblemId::new(6),
            ProblemKind::Puzzle,
            "What gets wetter the more it dries?",
            "towel",
        )
        .unwrap();
        assert!(p.accepts(" Towel "));
        assert!(!p.accepts("towels"));
    }

    #[test]
    fn rejects_blank_answer() {
        let err = Problem::new(ProblemId::new(1), ProblemKind::Math, "1 + 1?", " ").unwrap_err();
        assert_eq!(err, ProblemError::EmptyAnswer);
    }
}
