use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".to_string()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".to_string()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
