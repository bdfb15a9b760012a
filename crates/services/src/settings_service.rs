use std::sync::Arc;

use tracing::info;

use guessr_core::model::{SessionConfig, SessionConfigDraft};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;
use crate::sessions::Generation;

/// Loads and saves session settings; every save starts a new generation.
#[derive(Clone)]
pub struct SessionSettingsService {
    repo: Arc<dyn SettingsRepository>,
    generation: Generation,
}

impl SessionSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>, generation: Generation) -> Self {
        Self { repo, generation }
    }

    #[must_use]
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Load persisted settings; missing or invalid values take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<SessionConfig, SettingsServiceError> {
        Ok(self.repo.load_settings().await?)
    }

    /// Validate and persist new settings, invalidating in-flight sessions.
    ///
    /// Returns the stored config and the new generation.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation or persistence fails.
    pub async fn save(
        &self,
        draft: SessionConfigDraft,
    ) -> Result<(SessionConfig, u64), SettingsServiceError> {
        let config = draft.validate()?;
        self.repo.save_settings(&config).await?;
        let generation = self.generation.bump();
        info!(generation, mode = %config.mode(), "session settings saved");
        Ok((config, generation))
    }
}
