pub mod auth;
pub mod config;
pub mod http;
pub mod ports;
pub mod repositories;
pub mod store;
