use super::run_blocking;
use crate::domain::job::JobRecord;
use crate::error::{AppError, AppResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// CSV-backed job-history ledger, persisted independently of the live
/// job backend. Same lock discipline as the catalog: the mutex spans the
/// whole read + rewrite of any mutation.
pub struct JobHistoryRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JobHistoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, record: &JobRecord) -> AppResult<()> {
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
                .map_err(|e| AppError::Internal(format!("job history append: {}", e)))?;
            writer
                .flush()
                .map_err(|e| AppError::Internal(format!("job history flush: {}", e)))?;
            Ok(())
        })
        .await
    }

    pub async fn read_all(&self) -> AppResult<Vec<JobRecord>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        run_blocking(move || load_records(&path)).await
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<JobRecord>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let id = id.to_string();
        run_blocking(move || Ok(load_records(&path)?.into_iter().find(|r| r.id == id))).await
    }

    /// Mutate the record with the given id under the ledger lock. Returns
    /// the updated record, or None if no row matches.
    pub async fn update(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut JobRecord),
    ) -> AppResult<Option<JobRecord>> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();

        let mut records = {
            let path = path.clone();
            run_blocking(move || load_records(&path)).await?
        };
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        mutate(record);
        let updated = record.clone();
        run_blocking(move || rewrite_records(&path, &records)).await?;
        Ok(Some(updated))
    }
}

fn load_records(path: &Path) -> AppResult<Vec<JobRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Internal(format!("job history open: {}", e)))?;
    reader
        .deserialize()
        .collect::<Result<Vec<JobRecord>, _>>()
        .map_err(|e| AppError::Internal(format!("job history row: {}", e)))
}

fn rewrite_records(path: &Path, records: &[JobRecord]) -> AppResult<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .map_err(|e| AppError::Internal(format!("job history rewrite: {}", e)))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| AppError::Internal(format!("job history rewrite row: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::Internal(format!("job history rewrite flush: {}", e)))?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::STATUS_QUEUED;

    fn record(id: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            user: "alice".to_string(),
            text: "Hello there. General synthesis.".to_string(),
            status: STATUS_QUEUED.to_string(),
            submitted_at: "2026-08-31 10:00:00".to_string(),
            completed_at: String::new(),
            result_url: String::new(),
            error: String::new(),
        }
    }

    #[tokio::test]
    async fn test_append_find_update() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JobHistoryRepository::new(dir.path().join("job_history.csv"));

        repo.append(&record("j1")).await.unwrap();
        repo.append(&record("j2")).await.unwrap();

        let found = repo.find("j2").await.unwrap().unwrap();
        assert_eq!(found.status, "queued");

        let updated = repo
            .update("j2", |r| {
                r.status = "complete".to_string();
                r.result_url = "/download/x.wav".to_string();
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, "complete");

        // j1 is untouched
        assert_eq!(repo.find("j1").await.unwrap().unwrap().status, "queued");
        assert!(repo.find("missing").await.unwrap().is_none());
    }
}
