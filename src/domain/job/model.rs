use crate::infrastructure::ports::BackendState;
use serde::{Deserialize, Serialize};

/// Canonical job states. `queued → processing → {complete | error}`;
/// terminal states are sticky. Backend states outside the known set pass
/// through verbatim.
pub const STATUS_QUEUED: &str = "queued";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_COMPLETE: &str = "complete";
pub const STATUS_ERROR: &str = "error";

pub fn is_terminal(status: &str) -> bool {
    status == STATUS_COMPLETE || status == STATUS_ERROR
}

/// Fold a backend state into the canonical taxonomy, together with the
/// result URL / error message it carries.
pub fn canonicalize(state: &BackendState) -> (String, Option<String>, Option<String>) {
    match state {
        BackendState::Pending => (STATUS_QUEUED.to_string(), None, None),
        BackendState::Started => (STATUS_PROCESSING.to_string(), None, None),
        BackendState::Success { result_url } => {
            (STATUS_COMPLETE.to_string(), result_url.clone(), None)
        }
        BackendState::Failure { error } => {
            (STATUS_ERROR.to_string(), None, Some(error.clone()))
        }
        BackendState::Other(s) => (s.clone(), None, None),
    }
}

/// One row of the job-history ledger. Optional fields serialize as empty
/// strings so the CSV stays flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub user: String,
    pub text: String,
    pub status: String,
    pub submitted_at: String,
    pub completed_at: String,
    pub result_url: String,
    pub error: String,
}

/// Filters for the job-history listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilters {
    pub user: Option<String>,
    pub status: Option<String>,
}

impl JobFilters {
    pub fn matches(&self, record: &JobRecord) -> bool {
        if let Some(user) = &self.user {
            if &record.user != user {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &record.status != status {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_mapping() {
        assert_eq!(canonicalize(&BackendState::Pending).0, "queued");
        assert_eq!(canonicalize(&BackendState::Started).0, "processing");

        let (status, url, err) = canonicalize(&BackendState::Success {
            result_url: Some("/download/a.wav".to_string()),
        });
        assert_eq!(status, "complete");
        assert_eq!(url.as_deref(), Some("/download/a.wav"));
        assert!(err.is_none());

        let (status, url, err) = canonicalize(&BackendState::Failure {
            error: "boom".to_string(),
        });
        assert_eq!(status, "error");
        assert!(url.is_none());
        assert_eq!(err.as_deref(), Some("boom"));

        assert_eq!(
            canonicalize(&BackendState::Other("retrying".to_string())).0,
            "retrying"
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(is_terminal(STATUS_COMPLETE));
        assert!(is_terminal(STATUS_ERROR));
        assert!(!is_terminal(STATUS_QUEUED));
        assert!(!is_terminal(STATUS_PROCESSING));
        assert!(!is_terminal("retrying"));
    }
}
