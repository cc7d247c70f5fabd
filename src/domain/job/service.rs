use super::model::{canonicalize, is_terminal, JobFilters, JobRecord, STATUS_QUEUED};
use crate::domain::speech::SpeakRequest;
use crate::error::{AppError, AppResult};
use crate::infrastructure::ports::JobBackend;
use crate::infrastructure::repositories::JobHistoryRepository;
use chrono::Utc;
use std::sync::Arc;

/// Tracks async synthesis jobs: submissions go to the task backend, and a
/// history row is kept in the job ledger. The two are reconciled on every
/// poll because the backend's state is volatile while the ledger survives
/// restarts.
pub struct JobService {
    history: Arc<JobHistoryRepository>,
    backend: Arc<dyn JobBackend>,
}

impl JobService {
    pub fn new(history: Arc<JobHistoryRepository>, backend: Arc<dyn JobBackend>) -> Self {
        Self { history, backend }
    }

    pub async fn submit(
        &self,
        user: &str,
        tenant: &str,
        request: SpeakRequest,
    ) -> AppResult<String> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text input is required".to_string()));
        }

        let job_id = self
            .backend
            .enqueue(user.to_string(), tenant.to_string(), request.clone())
            .await
            .map_err(AppError::Internal)?;

        self.history
            .append(&JobRecord {
                id: job_id.clone(),
                user: user.to_string(),
                text: request.text,
                status: STATUS_QUEUED.to_string(),
                submitted_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                completed_at: String::new(),
                result_url: String::new(),
                error: String::new(),
            })
            .await?;

        tracing::info!(job = %job_id, user = %user, "Async job submitted");
        Ok(job_id)
    }

    /// Reconcile the backend's current state into the history row and
    /// return it. Terminal rows are never overwritten, even if the backend
    /// reports something else on a later poll.
    pub async fn poll(&self, job_id: &str) -> AppResult<JobRecord> {
        let record = self
            .history
            .find(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no such job: {}", job_id)))?;

        if is_terminal(&record.status) {
            return Ok(record);
        }

        let Some(state) = self.backend.status(job_id).await else {
            // Backend lost the handle (e.g. restart); the ledger is all we have
            return Ok(record);
        };

        let (status, result_url, error) = canonicalize(&state);
        if status == record.status {
            return Ok(record);
        }

        let updated = self
            .history
            .update(job_id, |r| {
                r.status = status.clone();
                if let Some(url) = &result_url {
                    r.result_url = url.clone();
                }
                if let Some(error) = &error {
                    r.error = error.clone();
                }
                if is_terminal(&status) {
                    r.completed_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
                }
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no such job: {}", job_id)))?;

        // The ledger row is now authoritative; release the backend's state
        // so the handle table does not grow without bound.
        if is_terminal(&updated.status) {
            self.backend.discard(job_id).await;
        }

        Ok(updated)
    }

    /// Paginated job history, newest first
    pub async fn list(
        &self,
        filters: &JobFilters,
        page: usize,
        page_size: usize,
    ) -> AppResult<(Vec<JobRecord>, usize)> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut matching: Vec<JobRecord> = self
            .history
            .read_all()
            .await?
            .into_iter()
            .filter(|r| filters.matches(r))
            .collect();
        matching.reverse();
        let total = matching.len();

        let rows = matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();
        Ok((rows, total))
    }
}
