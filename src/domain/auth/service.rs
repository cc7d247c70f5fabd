use super::dto::TokenResponse;
use super::error::AuthError;
use super::jwt::JwtManager;
use crate::infrastructure::repositories::UserRepository;
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<UserRepository>,
    jwt_manager: JwtManager,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: Arc<UserRepository>, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            user_repo,
            jwt_manager: JwtManager::new(jwt_secret, token_ttl_hours),
            token_ttl_hours,
        }
    }

    /// Verify credentials against the user store and issue a bearer token.
    /// Unknown users and bad passwords are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let user = self
            .user_repo
            .find(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.password != password {
            tracing::warn!(username = %username, "Login failed: bad password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt_manager.issue_token(&user.username, &user.tenant)?;

        tracing::info!(username = %username, tenant = %user.tenant, "Login successful");

        Ok(TokenResponse {
            token,
            expires_in: self.token_ttl_hours * 3600,
        })
    }
}
