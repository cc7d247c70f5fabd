pub mod audit_repository;
pub mod catalog_repository;
pub mod job_history_repository;
pub mod user_repository;

use crate::error::{AppError, AppResult};

/// Run ledger file I/O on the blocking pool so runtime worker threads stay
/// free while a ledger is read or rewritten.
pub(crate) async fn run_blocking<T: Send + 'static>(
    work: impl FnOnce() -> AppResult<T> + Send + 'static,
) -> AppResult<T> {
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("ledger io task: {}", e)))?
}

pub use audit_repository::AuditRepository;
pub use catalog_repository::{entries_to_csv, CatalogRepository};
pub use job_history_repository::JobHistoryRepository;
pub use user_repository::UserRepository;
