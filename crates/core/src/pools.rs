//! Static content pools: interruption problems and candidate passphrases.

use rand::Rng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::model::{Problem, ProblemId, ProblemKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("problem pool cannot be empty")]
    NoProblems,

    #[error("passphrase pool cannot be empty")]
    NoPassphrases,

    #[error("passphrase pool contains a blank entry")]
    BlankPassphrase,
}

const BUILTIN_PROBLEMS: &[(u32, ProblemKind, &str, &str)] = &[
    (1, ProblemKind::Math, "What is 15 × 7?", "105"),
    (
        2,
        ProblemKind::Puzzle,
        "What has keys but no locks, space but no room?",
        "keyboard",
    ),
    (3, ProblemKind::Math, "What is 234 ÷ 6?", "39"),
    (
        4,
        ProblemKind::Puzzle,
        "I am not alive, but I grow. I have no lungs, but I need air. What am I?",
        "fire",
    ),
    (5, ProblemKind::Math, "What is 12² - 8²?", "80"),
    (
        6,
        ProblemKind::Puzzle,
        "What gets wetter the more it dries?",
        "towel",
    ),
    (7, ProblemKind::Math, "What is 7 × 8 + 12?", "68"),
    (
        8,
        ProblemKind::Puzzle,
        "What has one eye but cannot see?",
        "needle",
    ),
];

const BUILTIN_PASSPHRASES: &[&str] = &[
    "password", "123456", "123456789", "qwerty", "abc123", "letmein", "monkey", "football",
    "iloveyou", "admin", "welcome", "login", "princess", "dragon", "sunshine", "passw0rd",
    "master", "hello", "ninja", "trustno1",
];

//
// ─── PROBLEMS ──────────────────────────────────────────────────────────────────
//

/// Non-empty collection of interruption problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemPool {
    problems: Vec<Problem>,
}

impl ProblemPool {
    /// # Errors
    ///
    /// Returns `PoolError::NoProblems` if `problems` is empty.
    pub fn new(problems: Vec<Problem>) -> Result<Self, PoolError> {
        if problems.is_empty() {
            return Err(PoolError::NoProblems);
        }
        Ok(Self { problems })
    }

    /// The eight math and riddle problems shipped with the workshop.
    ///
    /// # Panics
    ///
    /// Panics if the built-in table contains a blank entry.
    #[must_use]
    pub fn builtin() -> Self {
        let problems = BUILTIN_PROBLEMS
            .iter()
            .map(|&(id, kind, question, answer)| {
                Problem::new(ProblemId::new(id), kind, question, answer)
                    .expect("built-in problems are non-empty")
            })
            .collect();
        Self { problems }
    }

    /// Picks a problem uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &Problem {
        // Non-empty by construction.
        self.problems.choose(rng).unwrap_or(&self.problems[0])
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.problems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl Default for ProblemPool {
    fn default() -> Self {
        Self::builtin()
    }
}

//
// ─── PASSPHRASES ───────────────────────────────────────────────────────────────
//

/// Non-empty collection of candidate passphrases for pooled sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassphrasePool {
    phrases: Vec<String>,
}

impl PassphrasePool {
    /// # Errors
    ///
    /// Returns `PoolError` if the pool is empty or contains a blank phrase.
    pub fn new<I, S>(phrases: I) -> Result<Self, PoolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for phrase in phrases {
            let phrase = phrase.into().trim().to_string();
            if phrase.is_empty() {
                return Err(PoolError::BlankPassphrase);
            }
            out.push(phrase);
        }
        if out.is_empty() {
            return Err(PoolError::NoPassphrases);
        }
        Ok(Self { phrases: out })
    }

    /// Twenty of the most common leaked passwords.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            phrases: BUILTIN_PASSPHRASES.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// Picks a passphrase uniformly at random, upper-cased.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.phrases
            .choose(rng)
            .unwrap_or(&self.phrases[0])
            .to_uppercase()
    }

    #[must_use]
    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases
            .iter()
            .any(|p| crate::gate::answers_match(p, phrase))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for PassphrasePool {
    fn default() -> Self {
        Self::builtin()
    }
}
