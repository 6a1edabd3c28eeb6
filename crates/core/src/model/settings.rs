use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("distraction delay must be between 1 and 600 seconds, got {0}")]
    InvalidDistractionDelay(u64),
}

/// Runtime knobs for a workshop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopSettings {
    distraction_delay: Duration,
    secret_seed: Option<u64>,
    auto_start_distraction: bool,
}

impl WorkshopSettings {
    pub const DEFAULT_DISTRACTION_SECS: u64 = 10;

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidDistractionDelay` outside 1..=600 seconds.
    pub fn new(
        distraction_delay_secs: u64,
        secret_seed: Option<u64>,
        auto_start_distraction: bool,
    ) -> Result<Self, SettingsError> {
        if !(1..=600).contains(&distraction_delay_secs) {
            return Err(SettingsError::InvalidDistractionDelay(distraction_delay_secs));
        }
        Ok(Self {
            distraction_delay: Duration::from_secs(distraction_delay_secs),
            secret_seed,
            auto_start_distraction,
        })
    }

    /// Delay between one problem being cleared and the next one appearing.
    #[must_use]
    pub fn distraction_delay(&self) -> Duration {
        self.distraction_delay
    }

    /// Fixed seed for pooled secrets; `None` draws a fresh seed per run.
    #[must_use]
    pub fn secret_seed(&self) -> Option<u64> {
        self.secret_seed
    }

    /// Whether entering the distraction section starts the scheduler on its own.
    #[must_use]
    pub fn auto_start_distraction(&self) -> bool {
        self.auto_start_distraction
    }

    #[must_use]
    pub fn with_distraction_delay(mut self, delay: Duration) -> Self {
        self.distraction_delay = delay;
        self
    }

    #[must_use]
    pub fn with_secret_seed(mut self, seed: u64) -> Self {
        self.secret_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_auto_start_distraction(mut self, enabled: bool) -> Self {
        self.auto_start_distraction = enabled;
        self
    }
}

impl Default for WorkshopSettings {
    fn default() -> Self {
        Self {
            distraction_delay: Duration::from_secs(Self::DEFAULT_DISTRACTION_SECS),
            secret_seed: None,
            auto_start_distraction: true,
        }
    }
}
