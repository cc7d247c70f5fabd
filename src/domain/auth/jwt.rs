use super::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Username
    pub tenant: String,
    pub exp: i64,       // Expiration time
    pub iat: i64,       // Issued at
}

/// Decoded session extracted from a valid bearer token.
/// Never persisted; lives only for the duration of a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub tenant: String,
    pub expiry: DateTime<Utc>,
}

pub struct JwtManager {
    secret: String,
    ttl_hours: i64,
}

impl JwtManager {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_hours }
    }

    /// Issue a signed session token for a user
    pub fn issue_token(&self, username: &str, tenant: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: username.to_string(),
            tenant: tenant.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Validate a token's signature and expiry, yielding the session it encodes
    pub fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        let expiry = DateTime::from_timestamp(data.claims.exp, 0)
            .ok_or(AuthError::InvalidToken)?;

        Ok(Session {
            user: data.claims.sub,
            tenant: data.claims.tenant,
            expiry,
        })
    }
}
