pub mod model;
pub mod service;

pub use model::{AdminUser, AuditRecord, UserView};
pub use service::AdminService;
