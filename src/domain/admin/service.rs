use super::model::{AdminUser, AuditRecord, UserView};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{AuditRepository, UserRepository};
use chrono::Utc;
use std::sync::Arc;

pub struct AdminService {
    user_repo: Arc<UserRepository>,
    audit_repo: Arc<AuditRepository>,
}

impl AdminService {
    pub fn new(user_repo: Arc<UserRepository>, audit_repo: Arc<AuditRepository>) -> Self {
        Self {
            user_repo,
            audit_repo,
        }
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserView>> {
        Ok(self
            .user_repo
            .list()
            .await?
            .into_iter()
            .map(UserView::from)
            .collect())
    }

    pub async fn create_user(&self, acting_user: &str, user: AdminUser) -> AppResult<UserView> {
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".to_string(),
            ));
        }
        let view = UserView::from(user.clone());
        self.user_repo.create(user).await?;
        self.audit(acting_user, "create_user", &format!("target={}", view.username))
            .await?;
        Ok(view)
    }

    pub async fn update_user(
        &self,
        acting_user: &str,
        username: &str,
        password: Option<String>,
        tenant: Option<String>,
    ) -> AppResult<()> {
        let changed: Vec<&str> = [
            password.as_ref().map(|_| "password"),
            tenant.as_ref().map(|_| "tenant"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !self.user_repo.update(username, password, tenant).await? {
            return Err(AppError::NotFound(format!("no such user: {}", username)));
        }
        self.audit(
            acting_user,
            "update_user",
            &format!("target={} fields={}", username, changed.join("+")),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_user(&self, acting_user: &str, username: &str) -> AppResult<()> {
        if !self.user_repo.delete(username).await? {
            return Err(AppError::NotFound(format!("no such user: {}", username)));
        }
        self.audit(acting_user, "delete_user", &format!("target={}", username))
            .await?;
        Ok(())
    }

    pub async fn list_tenants(&self) -> AppResult<Vec<String>> {
        self.user_repo.distinct_tenants().await
    }

    pub async fn audit_log(&self) -> AppResult<Vec<AuditRecord>> {
        self.audit_repo.read_all().await
    }

    async fn audit(&self, acting_user: &str, action: &str, details: &str) -> AppResult<()> {
        self.audit_repo
            .append(&AuditRecord {
                timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                acting_user: acting_user.to_string(),
                action: action.to_string(),
                details: details.to_string(),
            })
            .await
    }
}
