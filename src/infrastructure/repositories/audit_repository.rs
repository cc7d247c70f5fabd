use super::run_blocking;
use crate::domain::admin::AuditRecord;
use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Append-only CSV audit trail for admin mutations
pub struct AuditRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, record: &AuditRecord) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let record = record.clone();
        run_blocking(move || {
            let write_header = !path.exists();
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(write_header)
                .from_writer(file);
            writer
                .serialize(&record)
                .map_err(|e| AppError::Internal(format!("audit append: {}", e)))?;
            writer
                .flush()
                .map_err(|e| AppError::Internal(format!("audit flush: {}", e)))?;
            Ok(())
        })
        .await
    }

    pub async fn read_all(&self) -> AppResult<Vec<AuditRecord>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || {
            if !path.exists() {
                return Ok(Vec::new());
            }
            let mut reader = csv::Reader::from_path(&path)
                .map_err(|e| AppError::Internal(format!("audit open: {}", e)))?;
            reader
                .deserialize()
                .collect::<Result<Vec<AuditRecord>, _>>()
                .map_err(|e| AppError::Internal(format!("audit row: {}", e)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let repo = AuditRepository::new(dir.path().join("audit_log.csv"));

        for action in ["create_user", "update_user", "delete_user"] {
            repo.append(&AuditRecord {
                timestamp: "2026-08-31 10:00:00".to_string(),
                acting_user: "admin".to_string(),
                action: action.to_string(),
                details: "target=bob".to_string(),
            })
            .await
            .unwrap();
        }

        let records = repo.read_all().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].action, "create_user");
        assert_eq!(records[2].action, "delete_user");
    }
}
