use super::run_blocking;
use crate::domain::admin::AdminUser;
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// JSON-file-backed user store. Mutations rewrite the whole file under the
/// store lock; the file is small by design.
pub struct UserRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Create the store with a seed admin account when the file is missing
    pub async fn seed_if_missing(&self, admin_username: &str, admin_password: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        if self.path.exists() {
            return Ok(());
        }
        tracing::warn!(
            username = %admin_username,
            path = %self.path.display(),
            "User store missing, seeding default admin account"
        );
        let path = self.path.clone();
        let seed = AdminUser {
            username: admin_username.to_string(),
            password: admin_password.to_string(),
            tenant: "default".to_string(),
        };
        run_blocking(move || save_users(&path, &[seed])).await
    }

    pub async fn find(&self, username: &str) -> AppResult<Option<AdminUser>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let username = username.to_string();
        run_blocking(move || {
            Ok(load_users(&path)?
                .into_iter()
                .find(|u| u.username == username))
        })
        .await
    }

    pub async fn list(&self) -> AppResult<Vec<AdminUser>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || load_users(&path)).await
    }

    pub async fn create(&self, user: AdminUser) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || {
            let mut users = load_users(&path)?;
            if users.iter().any(|u| u.username == user.username) {
                return Err(AppError::BadRequest(format!(
                    "user already exists: {}",
                    user.username
                )));
            }
            users.push(user);
            save_users(&path, &users)
        })
        .await
    }

    /// Update password and/or tenant. Returns false when no such user.
    pub async fn update(
        &self,
        username: &str,
        password: Option<String>,
        tenant: Option<String>,
    ) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let username = username.to_string();
        run_blocking(move || {
            let mut users = load_users(&path)?;
            let Some(user) = users.iter_mut().find(|u| u.username == username) else {
                return Ok(false);
            };
            if let Some(password) = password {
                user.password = password;
            }
            if let Some(tenant) = tenant {
                user.tenant = tenant;
            }
            save_users(&path, &users)?;
            Ok(true)
        })
        .await
    }

    pub async fn delete(&self, username: &str) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let username = username.to_string();
        run_blocking(move || {
            let mut users = load_users(&path)?;
            let before = users.len();
            users.retain(|u| u.username != username);
            if users.len() == before {
                return Ok(false);
            }
            save_users(&path, &users)?;
            Ok(true)
        })
        .await
    }

    /// Sorted distinct tenants across all users
    pub async fn distinct_tenants(&self) -> AppResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || {
            let mut tenants: Vec<String> = load_users(&path)?
                .into_iter()
                .map(|u| u.tenant)
                .collect();
            tenants.sort();
            tenants.dedup();
            Ok(tenants)
        })
        .await
    }
}

fn load_users(path: &Path) -> AppResult<Vec<AdminUser>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| AppError::Internal(format!("user store parse: {}", e)))
}

fn save_users(path: &Path, users: &[AdminUser]) -> AppResult<()> {
    let tmp = path.with_extension("json.tmp");
    let raw = serde_json::to_string_pretty(users)
        .map_err(|e| AppError::Internal(format!("user store serialize: {}", e)))?;
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, tenant: &str) -> AdminUser {
        AdminUser {
            username: name.to_string(),
            password: "pw".to_string(),
            tenant: tenant.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));

        repo.create(user("alice", "acme")).await.unwrap();
        repo.create(user("bob", "globex")).await.unwrap();
        assert!(repo.create(user("alice", "x")).await.is_err());

        assert_eq!(repo.find("alice").await.unwrap().unwrap().tenant, "acme");

        assert!(repo
            .update("alice", Some("new-pw".to_string()), None)
            .await
            .unwrap());
        assert_eq!(repo.find("alice").await.unwrap().unwrap().password, "new-pw");
        assert!(!repo.update("nobody", None, None).await.unwrap());

        assert!(repo.delete("bob").await.unwrap());
        assert!(!repo.delete("bob").await.unwrap());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_tenants_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));
        repo.create(user("a", "zeta")).await.unwrap();
        repo.create(user("b", "acme")).await.unwrap();
        repo.create(user("c", "acme")).await.unwrap();
        assert_eq!(
            repo.distinct_tenants().await.unwrap(),
            vec!["acme".to_string(), "zeta".to_string()]
        );
    }

    #[tokio::test]
    async fn test_seed_only_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = UserRepository::new(dir.path().join("users.json"));
        repo.seed_if_missing("admin", "secret").await.unwrap();
        repo.seed_if_missing("other", "x").await.unwrap();
        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
    }
}
