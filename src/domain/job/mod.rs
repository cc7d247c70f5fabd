pub mod model;
pub mod service;

pub use model::{
    canonicalize, is_terminal, JobFilters, JobRecord, STATUS_COMPLETE, STATUS_ERROR,
    STATUS_PROCESSING, STATUS_QUEUED,
};
pub use service::JobService;
