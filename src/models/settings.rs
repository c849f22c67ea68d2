//! Per-user API settings for external metadata sources

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One row per user. TMDB and Comic Vine keys fall back to the deployment
/// configuration when unset here; Jellyfin must be configured per user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApiSettings {
    #[serde(skip_serializing)]
    #[sqlx(default)]
    pub user_id: i32,
    pub tmdb_api_key: Option<String>,
    pub comicvine_api_key: Option<String>,
    pub jellyfin_server_url: Option<String>,
    pub jellyfin_api_key: Option<String>,
}

/// Update payload; `None` leaves a field untouched, empty string clears it
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateApiSettings {
    pub tmdb_api_key: Option<String>,
    pub comicvine_api_key: Option<String>,
    pub jellyfin_server_url: Option<String>,
    pub jellyfin_api_key: Option<String>,
}

/// Settings as shown back to the user: keys are masked, presence only
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiSettingsView {
    pub tmdb_configured: bool,
    pub comicvine_configured: bool,
    pub jellyfin_server_url: Option<String>,
    pub jellyfin_configured: bool,
}

impl From<ApiSettings> for ApiSettingsView {
    fn from(s: ApiSettings) -> Self {
        Self {
            tmdb_configured: s.tmdb_api_key.is_some(),
            comicvine_configured: s.comicvine_api_key.is_some(),
            jellyfin_server_url: s.jellyfin_server_url,
            jellyfin_configured: s.jellyfin_api_key.is_some(),
        }
    }
}
