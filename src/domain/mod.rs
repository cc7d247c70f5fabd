pub mod admin;
pub mod audio;
pub mod auth;
pub mod catalog;
pub mod chunker;
pub mod job;
pub mod ratelimit;
pub mod speech;
