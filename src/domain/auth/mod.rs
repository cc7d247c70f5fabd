pub mod dto;
pub mod error;
pub mod jwt;
pub mod service;

pub use dto::{LoginRequest, TokenResponse};
pub use error::AuthError;
pub use jwt::{Claims, JwtManager, Session};
pub use service::AuthService;
