use serde::{Deserialize, Serialize};

/// A managed account in the user store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    pub password: String,
    pub tenant: String,
}

/// One admin mutation, appended to the audit ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub acting_user: String,
    pub action: String,
    pub details: String,
}

/// User representation returned over the API (passwords never leave the
/// store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub tenant: String,
}

impl From<AdminUser> for UserView {
    fn from(user: AdminUser) -> Self {
        Self {
            username: user.username,
            tenant: user.tenant,
        }
    }
}
