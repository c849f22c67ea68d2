//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserClaims, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password, returning a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !Self::verify_password(&user.password_hash, password) {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let token = self.create_token(&user)?;
        Ok((token, user))
    }

    fn create_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(hash: &str, password: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        let hash = Self::hash_password(&request.password)?;
        let role = request.role.unwrap_or(Role::Reader);
        self.repository
            .users
            .create(
                &request.username,
                &hash,
                request.display_name.as_deref(),
                request.email.as_deref(),
                role.as_str(),
            )
            .await
    }

    pub async fn update_user(&self, id: i32, request: UpdateUser) -> AppResult<User> {
        let hash = match request.password.as_deref() {
            Some(password) => Some(Self::hash_password(password)?),
            None => None,
        };
        self.repository
            .users
            .update(
                id,
                hash.as_deref(),
                request.display_name.as_deref(),
                request.email.as_deref(),
                request.role.map(|r| r.as_str()),
            )
            .await
    }

    /// Deleting the last admin would lock everyone out
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let user = self.repository.users.get_by_id(id).await?;
        if user.role() == Role::Admin {
            let (admins, _) = self
                .repository
                .users
                .list(&UserQuery {
                    username: None,
                    page: None,
                    per_page: Some(100),
                })
                .await?;
            let admin_count = admins.iter().filter(|u| u.role() == Role::Admin).count();
            if admin_count <= 1 {
                return Err(AppError::Conflict(
                    "Cannot delete the only administrator".to_string(),
                ));
            }
        }
        self.repository.users.delete(id).await
    }

    /// Seed the configured admin account when the users table is empty.
    /// Runs once at startup so a fresh deployment is usable immediately.
    pub async fn ensure_admin_user(&self) -> AppResult<()> {
        if self.repository.users.count().await? > 0 {
            return Ok(());
        }

        let hash = Self::hash_password(&self.config.admin_password)?;
        self.repository
            .users
            .create(
                &self.config.admin_username,
                &hash,
                Some("Administrator"),
                None,
                Role::Admin.as_str(),
            )
            .await?;
        tracing::info!(
            "Seeded initial admin account '{}'",
            self.config.admin_username
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = AuthService::hash_password("correct horse").unwrap();
        assert!(AuthService::verify_password(&hash, "correct horse"));
        assert!(!AuthService::verify_password(&hash, "wrong horse"));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!AuthService::verify_password("not-a-phc-string", "anything"));
    }
}
