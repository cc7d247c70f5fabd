use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::admin::{AdminService, AdminUser, AuditRecord, UserView},
    error::AppResult,
    infrastructure::auth::AuthUser,
};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub tenant: Option<String>,
}

pub struct AdminController {
    admin_service: Arc<AdminService>,
}

impl AdminController {
    pub fn new(admin_service: Arc<AdminService>) -> Self {
        Self { admin_service }
    }

    /// GET /admin/users
    pub async fn list_users(
        State(controller): State<Arc<AdminController>>,
    ) -> AppResult<Json<Vec<UserView>>> {
        Ok(Json(controller.admin_service.list_users().await?))
    }

    /// POST /admin/users
    pub async fn create_user(
        State(controller): State<Arc<AdminController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(user): Json<AdminUser>,
    ) -> AppResult<(StatusCode, Json<UserView>)> {
        let view = controller
            .admin_service
            .create_user(&auth_user.username, user)
            .await?;
        Ok((StatusCode::CREATED, Json(view)))
    }

    /// PUT /admin/users/{username}
    pub async fn update_user(
        State(controller): State<Arc<AdminController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(username): Path<String>,
        Json(request): Json<UpdateUserRequest>,
    ) -> AppResult<StatusCode> {
        controller
            .admin_service
            .update_user(&auth_user.username, &username, request.password, request.tenant)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// DELETE /admin/users/{username}
    pub async fn delete_user(
        State(controller): State<Arc<AdminController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(username): Path<String>,
    ) -> AppResult<StatusCode> {
        controller
            .admin_service
            .delete_user(&auth_user.username, &username)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// GET /admin/tenants - Sorted distinct tenant list
    pub async fn list_tenants(
        State(controller): State<Arc<AdminController>>,
    ) -> AppResult<Json<Vec<String>>> {
        Ok(Json(controller.admin_service.list_tenants().await?))
    }

    /// GET /admin/audit-log - Full audit history
    pub async fn audit_log(
        State(controller): State<Arc<AdminController>>,
    ) -> AppResult<Json<Vec<AuditRecord>>> {
        Ok(Json(controller.admin_service.audit_log().await?))
    }
}
