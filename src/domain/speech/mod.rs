pub mod dto;
pub mod service;

pub use dto::{SpeakRequest, SpeakResponse};
pub use service::{SpeechConfig, SpeechService};
