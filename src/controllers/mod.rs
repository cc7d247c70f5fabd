pub mod admin;
pub mod auth;
pub mod catalog;
pub mod download;
pub mod health;
pub mod jobs;
pub mod speak;
