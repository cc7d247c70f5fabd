use crate::domain::audio::AudioFormat;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Port for lossy audio encoding (mp3/ogg). WAV output never touches this
/// trait; the assembler writes it in-process.
#[async_trait]
pub trait LossyCodec: Send + Sync {
    /// Transcode an in-memory WAV byte stream to the target format at the
    /// given bitrate. Errors carry the underlying codec message.
    async fn encode(
        &self,
        wav: &[u8],
        format: AudioFormat,
        bitrate_kbps: u32,
    ) -> Result<Vec<u8>, String>;
}

/// External encoder process (ffmpeg by default), fed WAV on stdin and read
/// back on stdout.
pub struct ProcessCodec {
    bin: String,
}

impl ProcessCodec {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }
}

#[async_trait]
impl LossyCodec for ProcessCodec {
    async fn encode(
        &self,
        wav: &[u8],
        format: AudioFormat,
        bitrate_kbps: u32,
    ) -> Result<Vec<u8>, String> {
        let (muxer, codec) = match format {
            AudioFormat::Mp3 => ("mp3", "libmp3lame"),
            AudioFormat::Ogg => ("ogg", "libvorbis"),
            AudioFormat::Wav => return Ok(wav.to_vec()),
        };

        let mut child = Command::new(&self.bin)
            .args([
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "pipe:0",
                "-c:a",
                codec,
                "-b:a",
                &format!("{}k", bitrate_kbps),
                "-f",
                muxer,
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn {}: {}", self.bin, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "encoder stdin unavailable".to_string())?;
        let input = wav.to_vec();
        let writer = tokio::spawn(async move {
            let _ = stdin.write_all(&input).await;
            // Dropping stdin closes the pipe so the encoder sees EOF
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| format!("encoder failed: {}", e))?;
        let _ = writer.await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "encoder exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        tracing::debug!(
            format = %format,
            bitrate_kbps = bitrate_kbps,
            input_bytes = wav.len(),
            output_bytes = output.stdout.len(),
            "Lossy encode completed"
        );

        Ok(output.stdout)
    }
}
