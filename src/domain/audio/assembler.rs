use super::format::{AudioFormat, Quality};
use crate::error::{AppError, AppResult};
use crate::infrastructure::ports::LossyCodec;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::sync::Arc;

/// One synthesized waveform. Ephemeral: produced per chunk by the
/// synthesizer and consumed immediately by the assembler.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioSegment {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Stitch the per-chunk segments into one continuous waveform.
///
/// Segments are concatenated at the sample level in order. All segments are
/// expected to share the first segment's rate and channel count; mismatches
/// are coerced to the first segment's parameters with a warning rather than
/// resampled.
pub fn combine(segments: Vec<AudioSegment>) -> Option<AudioSegment> {
    let mut iter = segments.into_iter();
    let mut combined = iter.next()?;

    for segment in iter {
        if segment.sample_rate != combined.sample_rate || segment.channels != combined.channels {
            tracing::warn!(
                expected_rate = combined.sample_rate,
                got_rate = segment.sample_rate,
                expected_channels = combined.channels,
                got_channels = segment.channels,
                "Segment parameters differ, coercing to first segment's"
            );
        }
        combined.samples.extend(segment.samples);
    }

    Some(combined)
}

/// Encodes assembled waveforms to the requested container. WAV is written
/// in-process; mp3/ogg go through the external codec port.
pub struct Assembler {
    codec: Arc<dyn LossyCodec>,
}

impl Assembler {
    pub fn new(codec: Arc<dyn LossyCodec>) -> Self {
        Self { codec }
    }

    pub async fn encode(
        &self,
        segment: &AudioSegment,
        format: AudioFormat,
        quality: Quality,
    ) -> AppResult<Vec<u8>> {
        let wav = encode_wav(segment)?;
        match format {
            AudioFormat::Wav => Ok(wav),
            AudioFormat::Mp3 | AudioFormat::Ogg => self
                .codec
                .encode(&wav, format, quality.bitrate_kbps())
                .await
                .map_err(AppError::Encoding),
        }
    }
}

/// Write 16-bit PCM samples to an in-memory WAV container
pub fn encode_wav(segment: &AudioSegment) -> AppResult<Vec<u8>> {
    let spec = WavSpec {
        channels: segment.channels,
        sample_rate: segment.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| AppError::Encoding(format!("WAV writer: {}", e)))?;
        for sample in &segment.samples {
            writer
                .write_sample(*sample)
                .map_err(|e| AppError::Encoding(format!("WAV write: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| AppError::Encoding(format!("WAV finalize: {}", e)))?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(samples: Vec<i16>) -> AudioSegment {
        AudioSegment {
            samples,
            sample_rate: 22050,
            channels: 1,
        }
    }

    #[test]
    fn test_combine_single_passes_through() {
        let combined = combine(vec![segment(vec![1, 2, 3])]).unwrap();
        assert_eq!(combined.samples, vec![1, 2, 3]);
        assert_eq!(combined.sample_rate, 22050);
    }

    #[test]
    fn test_combine_concatenates_in_order() {
        let combined =
            combine(vec![segment(vec![1, 2]), segment(vec![3]), segment(vec![4, 5])]).unwrap();
        assert_eq!(combined.samples, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_combine_empty_is_none() {
        assert!(combine(Vec::new()).is_none());
    }

    #[test]
    fn test_combine_coerces_mismatched_rate() {
        let mut other = segment(vec![9, 9]);
        other.sample_rate = 44100;
        let combined = combine(vec![segment(vec![1]), other]).unwrap();
        assert_eq!(combined.sample_rate, 22050);
        assert_eq!(combined.samples, vec![1, 9, 9]);
    }

    #[test]
    fn test_encode_wav_is_readable() {
        let bytes = encode_wav(&segment(vec![0, 100, -100, 32000])).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, 32000]);
    }

    #[test]
    fn test_duration() {
        let seg = segment(vec![0; 22050]);
        assert!((seg.duration_secs() - 1.0).abs() < 1e-9);
    }
}
