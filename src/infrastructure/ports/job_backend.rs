use crate::domain::speech::{SpeakRequest, SpeechService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Raw execution state reported by the task backend. The job tracker folds
/// these into its canonical taxonomy on each poll.
#[derive(Debug, Clone)]
pub enum BackendState {
    Pending,
    Started,
    Success { result_url: Option<String> },
    Failure { error: String },
    Other(String),
}

/// Port for the task-execution backend that runs async synthesis jobs.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Enqueue a synthesis job, returning an opaque handle for polling
    async fn enqueue(
        &self,
        user: String,
        tenant: String,
        request: SpeakRequest,
    ) -> Result<String, String>;

    /// Current backend state for a handle, None if the backend has no
    /// record of it (e.g. after a restart)
    async fn status(&self, handle: &str) -> Option<BackendState>;

    /// Drop the backend's record of a handle. Called once the terminal
    /// state has been reconciled into the job ledger, which is the source
    /// of truth from then on; unknown handles are ignored.
    async fn discard(&self, handle: &str);
}

/// In-process backend: each job runs on a spawned tokio task against the
/// same synthesis pipeline the synchronous path uses. State lives in a
/// shared table keyed by handle.
pub struct TokioJobBackend {
    pipeline: Arc<SpeechService>,
    states: Arc<Mutex<HashMap<String, BackendState>>>,
}

impl TokioJobBackend {
    pub fn new(pipeline: Arc<SpeechService>) -> Self {
        Self {
            pipeline,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl JobBackend for TokioJobBackend {
    async fn enqueue(
        &self,
        user: String,
        tenant: String,
        request: SpeakRequest,
    ) -> Result<String, String> {
        let handle = Uuid::new_v4().to_string();
        self.states
            .lock()
            .unwrap()
            .insert(handle.clone(), BackendState::Pending);

        let pipeline = self.pipeline.clone();
        let states = self.states.clone();
        let task_handle = handle.clone();

        tokio::spawn(async move {
            states
                .lock()
                .unwrap()
                .insert(task_handle.clone(), BackendState::Started);

            let outcome = pipeline.speak(&user, &tenant, request).await;

            let state = match outcome {
                Ok(response) => {
                    tracing::info!(job = %task_handle, url = %response.url, "Async job finished");
                    BackendState::Success {
                        result_url: Some(response.url),
                    }
                }
                Err(e) => {
                    tracing::error!(job = %task_handle, error = %e, "Async job failed");
                    BackendState::Failure {
                        error: e.to_string(),
                    }
                }
            };

            states.lock().unwrap().insert(task_handle, state);
        });

        Ok(handle)
    }

    async fn status(&self, handle: &str) -> Option<BackendState> {
        self.states.lock().unwrap().get(handle).cloned()
    }

    async fn discard(&self, handle: &str) {
        self.states.lock().unwrap().remove(handle);
    }
}
