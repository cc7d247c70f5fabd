use super::dto::{SpeakRequest, SpeakResponse};
use crate::domain::audio::{combine, Assembler, AudioFormat, AudioSegment, Quality};
use crate::domain::catalog::CatalogEntry;
use crate::domain::chunker;
use crate::error::{AppError, AppResult};
use crate::infrastructure::ports::{SpeechSynthesizer, SynthesisOptions};
use crate::infrastructure::repositories::CatalogRepository;
use crate::infrastructure::store::OutputStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Settings for the chunk/synthesize/assemble pipeline
pub struct SpeechConfig {
    pub chunk_max_chars: usize,
    pub chunk_overlap_chars: usize,
    pub synthesis_timeout: Duration,
}

/// The synchronous synthesis pipeline: chunk the text, synthesize each
/// chunk, stitch, encode, place on disk, mirror, and catalog. The async
/// job path runs the same pipeline from a background task.
pub struct SpeechService {
    config: SpeechConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    assembler: Assembler,
    output_store: Arc<OutputStore>,
    catalog_repo: Arc<CatalogRepository>,
}

impl SpeechService {
    pub fn new(
        config: SpeechConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        assembler: Assembler,
        output_store: Arc<OutputStore>,
        catalog_repo: Arc<CatalogRepository>,
    ) -> Self {
        Self {
            config,
            synthesizer,
            assembler,
            output_store,
            catalog_repo,
        }
    }

    pub async fn speak(
        &self,
        user: &str,
        tenant: &str,
        request: SpeakRequest,
    ) -> AppResult<SpeakResponse> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text input is required".to_string()));
        }

        let format = match &request.format {
            None => AudioFormat::Wav,
            Some(s) => AudioFormat::parse(s)
                .ok_or_else(|| AppError::Unprocessable(format!("unsupported format: {}", s)))?,
        };
        let quality = request
            .quality
            .as_deref()
            .map(Quality::parse_lenient)
            .unwrap_or(Quality::Medium);

        let normalized = chunker::normalize(&request.text);
        let length = normalized.chars().count() as u64;
        let chunks = chunker::split(
            &request.text,
            self.config.chunk_max_chars,
            self.config.chunk_overlap_chars,
        );

        tracing::info!(
            user = %user,
            text_length = length,
            chunk_count = chunks.len(),
            format = %format,
            quality = %quality,
            "Synthesis request"
        );

        let options = SynthesisOptions {
            voice: request.voice.clone(),
            speed: request.speed.clone(),
            pitch: request.pitch.clone(),
            tone: request.tone.clone(),
            prompt: request.prompt.clone(),
        };

        let mut segments: Vec<AudioSegment> = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let segment =
                tokio::time::timeout(self.config.synthesis_timeout, self.synthesizer.synthesize(chunk, &options))
                    .await
                    .map_err(|_| {
                        AppError::Synthesis(format!("synthesis timed out on chunk {}", index))
                    })?
                    .map_err(AppError::Synthesis)?;
            tracing::debug!(
                chunk_index = index,
                chunk_chars = chunk.chars().count(),
                samples = segment.samples.len(),
                "Chunk synthesized"
            );
            segments.push(segment);
        }

        let combined = combine(segments)
            .ok_or_else(|| AppError::Synthesis("synthesizer produced no audio".to_string()))?;
        let duration = combined.duration_secs();

        let encoded = self.assembler.encode(&combined, format, quality).await?;

        let title = request.title.clone().unwrap_or_default();
        let hint = if title.is_empty() {
            normalized.chars().take(32).collect::<String>()
        } else {
            title.clone()
        };
        let relative_path = self
            .output_store
            .place(&encoded, &hint, format.extension())
            .await?;
        let file_path = relative_path.to_string_lossy().replace('\\', "/");
        let url = format!("/download/{}", file_path);

        // Mirror after the file is on disk; no ledger lock is held here and
        // a failure only costs us the mirror URL.
        let object_store_url = self.output_store.mirror(&relative_path).await;

        let entry = CatalogEntry {
            id: Uuid::new_v4().to_string(),
            title,
            date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            length,
            tone: request.tone.unwrap_or_default(),
            prompt: request.prompt.unwrap_or_default(),
            voice: request.voice.unwrap_or_default(),
            speed: request.speed.unwrap_or_default(),
            pitch: request.pitch.unwrap_or_default(),
            format: format.to_string(),
            quality: quality.to_string(),
            file_path: file_path.clone(),
            user: user.to_string(),
            tenant: tenant.to_string(),
            object_store_url: object_store_url.clone().unwrap_or_default(),
        };
        self.catalog_repo.append(&entry).await?;

        tracing::info!(
            user = %user,
            path = %file_path,
            duration_secs = duration,
            "Synthesis complete"
        );

        Ok(SpeakResponse {
            file_path,
            url,
            object_store_url,
            title: entry.title,
            duration,
            length,
        })
    }
}
