//! Per-user API settings repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::settings::ApiSettings};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Settings for one user; a user without a row gets the defaults
    pub async fn get(&self, user_id: i32) -> AppResult<ApiSettings> {
        let settings = sqlx::query_as::<_, ApiSettings>(
            "SELECT * FROM api_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings.unwrap_or(ApiSettings {
            user_id,
            ..Default::default()
        }))
    }

    /// Upsert one user's settings. `None` keeps the stored value, an empty
    /// string clears it.
    pub async fn upsert(
        &self,
        user_id: i32,
        tmdb_api_key: Option<&str>,
        comicvine_api_key: Option<&str>,
        jellyfin_server_url: Option<&str>,
        jellyfin_api_key: Option<&str>,
    ) -> AppResult<ApiSettings> {
        let settings = sqlx::query_as::<_, ApiSettings>(
            r#"
            INSERT INTO api_settings (user_id, tmdb_api_key, comicvine_api_key, jellyfin_server_url, jellyfin_api_key)
            VALUES ($1, NULLIF($2, ''), NULLIF($3, ''), NULLIF($4, ''), NULLIF($5, ''))
            ON CONFLICT (user_id) DO UPDATE SET
                tmdb_api_key = NULLIF(COALESCE($2, api_settings.tmdb_api_key), ''),
                comicvine_api_key = NULLIF(COALESCE($3, api_settings.comicvine_api_key), ''),
                jellyfin_server_url = NULLIF(COALESCE($4, api_settings.jellyfin_server_url), ''),
                jellyfin_api_key = NULLIF(COALESCE($5, api_settings.jellyfin_api_key), '')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tmdb_api_key)
        .bind(comicvine_api_key)
        .bind(jellyfin_server_url)
        .bind(jellyfin_api_key)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    /// First Jellyfin configuration found across all users.
    ///
    /// The image relay route serves `<img>` loads, which carry no bearer
    /// token, so it cannot resolve settings per caller. A Shelfmark
    /// deployment is one household pointing at one Jellyfin server.
    pub async fn any_jellyfin(&self) -> AppResult<Option<(String, String)>> {
        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT jellyfin_server_url, jellyfin_api_key FROM api_settings
            WHERE jellyfin_server_url IS NOT NULL AND jellyfin_api_key IS NOT NULL
            ORDER BY user_id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
