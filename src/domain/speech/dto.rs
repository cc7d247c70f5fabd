use serde::{Deserialize, Serialize};

/// Body for POST /speak and the form fields of POST /speak-file.
/// `format` must be one of wav/mp3/ogg (422 otherwise); an unrecognized
/// `quality` silently coerces to medium. The remaining knobs pass through
/// to the synthesizer untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub voice: Option<String>,
    pub speed: Option<String>,
    pub pitch: Option<String>,
    pub format: Option<String>,
    pub quality: Option<String>,
    pub tone: Option<String>,
    pub prompt: Option<String>,
    pub title: Option<String>,
}

/// Response for the synchronous synthesis endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakResponse {
    pub file_path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_store_url: Option<String>,
    pub title: String,
    pub duration: f64,
    pub length: u64,
}
