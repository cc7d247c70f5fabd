use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    domain::{
        ratelimit::{Admission, RateLimiter},
        speech::{SpeakRequest, SpeakResponse, SpeechService},
    },
    error::{AppError, AppResult},
    infrastructure::auth::AuthUser,
};

pub struct SpeakController {
    speech_service: Arc<SpeechService>,
    rate_limiter: Arc<RateLimiter>,
}

impl SpeakController {
    pub fn new(speech_service: Arc<SpeechService>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            speech_service,
            rate_limiter,
        }
    }

    fn admit(&self, user: &str) -> AppResult<()> {
        match self.rate_limiter.admit(user) {
            Admission::Allowed => Ok(()),
            Admission::RateLimited => Err(AppError::RateLimited(
                "too many requests, slow down".to_string(),
            )),
        }
    }

    /// POST /speak - Synchronous synthesis from a JSON body
    pub async fn speak(
        State(controller): State<Arc<SpeakController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<SpeakRequest>,
    ) -> AppResult<Json<SpeakResponse>> {
        controller.admit(&auth_user.username)?;

        let response = controller
            .speech_service
            .speak(&auth_user.username, &auth_user.tenant, request)
            .await?;
        Ok(Json(response))
    }

    /// POST /speak-file - Synchronous synthesis from an uploaded document.
    /// Accepts .txt and .md as raw text, .json with a `text` field; the
    /// remaining options arrive as ordinary form fields.
    pub async fn speak_file(
        State(controller): State<Arc<SpeakController>>,
        Extension(auth_user): Extension<AuthUser>,
        mut multipart: Multipart,
    ) -> AppResult<Json<SpeakResponse>> {
        controller.admit(&auth_user.username)?;

        let mut request = SpeakRequest::default();
        let mut file: Option<(String, Vec<u8>)> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("bad multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("bad upload: {}", e)))?;
                    file = Some((filename, bytes.to_vec()));
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("bad form field: {}", e)))?;
                    match name.as_str() {
                        "voice" => request.voice = Some(value),
                        "speed" => request.speed = Some(value),
                        "pitch" => request.pitch = Some(value),
                        "format" => request.format = Some(value),
                        "quality" => request.quality = Some(value),
                        "tone" => request.tone = Some(value),
                        "prompt" => request.prompt = Some(value),
                        "title" => request.title = Some(value),
                        _ => {}
                    }
                }
            }
        }

        let (filename, bytes) =
            file.ok_or_else(|| AppError::BadRequest("file field is required".to_string()))?;
        request.text = extract_text(&filename, &bytes)?;
        if request.title.is_none() {
            request.title = filename
                .rsplit_once('.')
                .map(|(stem, _)| stem.to_string())
                .filter(|s| !s.is_empty());
        }

        let response = controller
            .speech_service
            .speak(&auth_user.username, &auth_user.tenant, request)
            .await?;
        Ok(Json(response))
    }
}

/// Pull synthesizable text out of an uploaded document
fn extract_text(filename: &str, bytes: &[u8]) -> AppResult<String> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => String::from_utf8(bytes.to_vec())
            .map_err(|_| AppError::BadRequest("file is not valid UTF-8".to_string())),
        "json" => {
            let value: serde_json::Value = serde_json::from_slice(bytes)
                .map_err(|e| AppError::BadRequest(format!("invalid JSON upload: {}", e)))?;
            value
                .get("text")
                .and_then(|t| t.as_str())
                .map(|t| t.to_string())
                .ok_or_else(|| {
                    AppError::BadRequest("JSON upload must contain a \"text\" field".to_string())
                })
        }
        other => Err(AppError::Unprocessable(format!(
            "unsupported upload type: .{} (expected .txt, .md or .json)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_plain() {
        assert_eq!(extract_text("notes.txt", b"hello").unwrap(), "hello");
        assert_eq!(extract_text("notes.md", b"# hello").unwrap(), "# hello");
    }

    #[test]
    fn test_extract_text_json() {
        let text = extract_text("doc.json", br#"{"text": "from json"}"#).unwrap();
        assert_eq!(text, "from json");
        assert!(extract_text("doc.json", br#"{"body": "x"}"#).is_err());
    }

    #[test]
    fn test_extract_text_rejects_other_types() {
        assert!(matches!(
            extract_text("audio.wav", b"RIFF"),
            Err(AppError::Unprocessable(_))
        ));
        assert!(matches!(
            extract_text("noext", b"x"),
            Err(AppError::Unprocessable(_))
        ));
    }
}
