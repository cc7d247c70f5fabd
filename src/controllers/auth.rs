use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    domain::auth::{AuthService, LoginRequest, TokenResponse},
    error::AppResult,
};

pub struct AuthController {
    auth_service: Arc<AuthService>,
}

impl AuthController {
    pub fn new(auth_service: Arc<AuthService>) -> Self {
        Self { auth_service }
    }

    /// POST /login - Exchange credentials for a bearer token
    pub async fn login(
        State(controller): State<Arc<AuthController>>,
        Json(request): Json<LoginRequest>,
    ) -> AppResult<Json<TokenResponse>> {
        let response = controller
            .auth_service
            .login(&request.username, &request.password)
            .await?;
        Ok(Json(response))
    }
}
