use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::SectionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SectionError {
    #[error("section id cannot be empty")]
    EmptyId,

    #[error("section title cannot be empty")]
    EmptyTitle,

    #[error("fixed secret for section {0} cannot be empty")]
    EmptySecret(SectionId),
}

//
// ─── TEMPLATE ──────────────────────────────────────────────────────────────────
//

/// Where a section's secret comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecretSource {
    /// The same passphrase on every run.
    Fixed(String),
    /// Drawn once per run from the passphrase pool.
    Pool,
}

/// Static description of a section, resolved into a [`Section`] when a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTemplate {
    id: SectionId,
    title: String,
    source: SecretSource,
    requires_distraction: bool,
}

impl SectionTemplate {
    /// Section with a fixed passphrase.
    ///
    /// # Errors
    ///
    /// Returns `SectionError` if the id, title or secret is blank.
    pub fn fixed(
        id: impl AsRef<str>,
        title: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, SectionError> {
        let id = SectionId::new(id);
        let secret = secret.into().trim().to_string();
        if secret.is_empty() && !id.is_empty() {
            return Err(SectionError::EmptySecret(id));
        }
        Self::build(id, title.into(), SecretSource::Fixed(secret))
    }

    /// Section whose passphrase is drawn from the pool at run start.
    ///
    /// # Errors
    ///
    /// Returns `SectionError` if the id or title is blank.
    pub fn pooled(id: impl AsRef<str>, title: impl Into<String>) -> Result<Self, SectionError> {
        Self::build(SectionId::new(id), title.into(), SecretSource::Pool)
    }

    fn build(id: SectionId, title: String, source: SecretSource) -> Result<Self, SectionError> {
        if id.is_empty() {
            return Err(SectionError::EmptyId);
        }
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(SectionError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            source,
            requires_distraction: false,
        })
    }

    /// Marks this section as the one gated by the distraction scheduler.
    #[must_use]
    pub fn with_distraction(mut self) -> Self {
        self.requires_distraction = true;
        self
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn source(&self) -> &SecretSource {
        &self.source
    }

    #[must_use]
    pub fn requires_distraction(&self) -> bool {
        self.requires_distraction
    }
}

//
// ─── SECTION ───────────────────────────────────────────────────────────────────
//

/// A section of one run, with its secret already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    title: String,
    secret: String,
    requires_distraction: bool,
}

impl Section {
    #[must_use]
    pub fn from_template(template: &SectionTemplate, secret: String) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            secret,
            requires_distraction: template.requires_distraction,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn requires_distraction(&self) -> bool {
        self.requires_distraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_template_trims_secret() {
        let t = SectionTemplate::fixed("Cognitive", "Cognitive Challenge", "  FOCUS ")
            .unwrap()
            .with_distraction();
        assert_eq!(t.id().as_str(), "cognitive");
        assert_eq!(t.source(), &SecretSource::Fixed("FOCUS".into()));
        assert!(t.requires_distraction());
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            SectionTemplate::pooled(" ", "Vision").unwrap_err(),
            SectionError::EmptyId
        );
        assert_eq!(
            SectionTemplate::pooled("vision", "").unwrap_err(),
            SectionError::EmptyTitle
        );
        assert!(matches!(
            SectionTemplate::fixed("hearing", "Hearing", "   "),
            Err(SectionError::EmptySecret(_))
        ));
    }
}
