//! Per-user API settings service

use crate::{
    error::AppResult,
    models::settings::{ApiSettingsView, UpdateApiSettings},
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Settings as shown to the user, keys masked to presence flags
    pub async fn get_settings(&self, user_id: i32) -> AppResult<ApiSettingsView> {
        let settings = self.repository.settings.get(user_id).await?;
        Ok(settings.into())
    }

    pub async fn update_settings(
        &self,
        user_id: i32,
        request: UpdateApiSettings,
    ) -> AppResult<ApiSettingsView> {
        let settings = self
            .repository
            .settings
            .upsert(
                user_id,
                request.tmdb_api_key.as_deref(),
                request.comicvine_api_key.as_deref(),
                request.jellyfin_server_url.as_deref(),
                request.jellyfin_api_key.as_deref(),
            )
            .await?;
        Ok(settings.into())
    }
}
