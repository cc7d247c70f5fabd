pub mod model;
pub mod service;

pub use model::{CatalogEntry, CatalogFilters, CatalogUpdate};
pub use service::{BatchAction, BatchOutcome, CatalogService, DEFAULT_PAGE_SIZE};
