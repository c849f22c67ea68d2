//! Business logic services

pub mod auth;
pub mod catalog;
pub mod lending;
pub mod lookup;
pub mod reading;
pub mod settings;

use crate::{
    config::{AuthConfig, LookupConfig, StorageConfig},
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub reading: reading::ReadingService,
    pub lending: lending::LendingService,
    pub lookup: lookup::LookupService,
    pub settings: settings::SettingsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        storage_config: StorageConfig,
        lookup_config: LookupConfig,
    ) -> AppResult<Self> {
        // One outbound client for every source; MusicBrainz requires the
        // descriptive User-Agent, the others tolerate it
        let http = reqwest::Client::builder()
            .user_agent(lookup_config.musicbrainz_user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone(), storage_config.cover_dir),
            reading: reading::ReadingService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone()),
            lookup: lookup::LookupService::new(repository.clone(), lookup_config, http),
            settings: settings::SettingsService::new(repository),
        })
    }
}
