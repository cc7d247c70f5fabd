use crate::domain::audio::AudioSegment;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Knobs forwarded to the synthesis model. All optional pass-through
/// values; the model applies its own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub voice: Option<String>,
    pub speed: Option<String>,
    pub pitch: Option<String>,
    pub tone: Option<String>,
    pub prompt: Option<String>,
}

/// Port for the external speech model.
///
/// Implementations receive one text chunk at a time; chunking and stitching
/// are the caller's concern. Model loading and inference internals live
/// entirely behind this trait.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one chunk of text into PCM samples
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioSegment, String>;
}

/// Remote synthesis model reached over HTTP. The model server takes the
/// text plus options as JSON and answers with raw samples and a rate.
pub struct HttpSynthesizer {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    #[serde(flatten)]
    options: &'a SynthesisOptions,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    samples: Vec<i16>,
    sample_rate: u32,
    #[serde(default)]
    channels: Option<u16>,
}

impl HttpSynthesizer {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioSegment, String> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.url)
            .json(&SynthesizeRequest { text, options })
            .send()
            .await
            .map_err(|e| format!("synthesizer unreachable: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("synthesizer returned {}: {}", status, body));
        }

        let payload: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| format!("bad synthesizer response: {}", e))?;

        tracing::info!(
            text_length = text.len(),
            sample_count = payload.samples.len(),
            sample_rate = payload.sample_rate,
            latency_ms = start.elapsed().as_millis(),
            "Synthesis completed"
        );

        Ok(AudioSegment {
            samples: payload.samples,
            sample_rate: payload.sample_rate,
            channels: payload.channels.unwrap_or(1),
        })
    }
}

/// Deterministic stand-in used in development mode and tests: renders each
/// input byte as a short fixed-amplitude pulse, so output length tracks
/// input length and identical text always yields identical audio.
pub struct TestToneSynthesizer {
    pub sample_rate: u32,
}

impl Default for TestToneSynthesizer {
    fn default() -> Self {
        Self { sample_rate: 22050 }
    }
}

#[async_trait]
impl SpeechSynthesizer for TestToneSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _options: &SynthesisOptions,
    ) -> Result<AudioSegment, String> {
        let samples: Vec<i16> = text
            .bytes()
            .flat_map(|b| {
                let level = (b as i16 - 64) * 128;
                [level, level / 2, 0, -level / 2]
            })
            .collect();

        Ok(AudioSegment {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        })
    }
}
