use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::domain::auth::JwtManager;
use crate::error::AppError;
use crate::infrastructure::config::Config;

/// User context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub tenant: String,
}

fn session_from_request(config: &Config, request: &Request) -> Result<AuthUser, AppError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized(
            "Invalid authorization format".to_string(),
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    // Validation is stateless: the shared secret is enough for any replica
    let jwt_manager = JwtManager::new(config.jwt_secret.clone(), config.token_ttl_hours);
    let session = jwt_manager.verify(token)?;

    Ok(AuthUser {
        username: session.user,
        tenant: session.tenant,
    })
}

/// Authentication middleware for bearer-protected routes
pub async fn auth_middleware(
    State(config): State<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = session_from_request(&config, &request)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Admin middleware: a valid token whose user is in the configured admin
/// set. Everyone else gets a 403.
pub async fn admin_middleware(
    State(config): State<Arc<Config>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = session_from_request(&config, &request)?;

    if !config.is_admin(&auth_user.username) {
        tracing::warn!(username = %auth_user.username, "Admin route denied");
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}
