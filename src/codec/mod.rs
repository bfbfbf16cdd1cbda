//! Canonical PCM container — the artifact a completed session produces.
//!
//! A capture session ends as an [`EncodedAudioArtifact`]: a 44-byte
//! RIFF/WAVE header followed by interleaved signed 16-bit little-endian
//! samples.  The encoder is bit-exact and reproducible; downstream
//! classification depends on that contract.  See [`wav`] for the encode /
//! decode functions and the quantization rule.

pub mod wav;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub use wav::{decode_wav, dequantize, encode_wav, quantize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while producing an artifact.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("WAV write failed: {0}")]
    Write(#[from] hound::Error),

    #[error("invalid sample layout: {0}")]
    InvalidLayout(String),
}

/// Errors raised while reading WAV bytes back into a waveform.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("WAV parse failed: {0}")]
    Parse(#[from] hound::Error),

    #[error("unsupported WAV layout: {0}")]
    UnsupportedLayout(String),
}

// ---------------------------------------------------------------------------
// EncodedAudioArtifact
// ---------------------------------------------------------------------------

/// Immutable encoded audio: canonical header + PCM payload + derived
/// duration.  Produced at most once per completed session; cloning shares
/// the underlying bytes.
#[derive(Clone)]
pub struct EncodedAudioArtifact {
    bytes: Arc<[u8]>,
    sample_rate: u32,
    channels: u16,
    frame_count: u32,
}

impl EncodedAudioArtifact {
    pub(crate) fn from_parts(
        bytes: Vec<u8>,
        sample_rate: u32,
        channels: u16,
        frame_count: u32,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            sample_rate,
            channels,
            frame_count,
        }
    }

    /// Build an artifact from existing canonical WAV bytes (e.g. a denoiser
    /// response), validating the layout.
    pub fn from_wav_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let reader = hound::WavReader::new(std::io::Cursor::new(&bytes))?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(DecodeError::UnsupportedLayout(format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }
        let frame_count = reader.duration();
        Ok(Self::from_parts(
            bytes,
            spec.sample_rate,
            spec.channels,
            frame_count,
        ))
    }

    /// The complete container bytes (header + payload).
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, for consumers that need ownership
    /// (playback decoding, uploads) without copying.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames in the payload.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Playback duration derived from frame count and sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(f64::from(self.frame_count) / f64::from(self.sample_rate))
    }
}

impl std::fmt::Debug for EncodedAudioArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedAudioArtifact")
            .field("bytes", &self.bytes.len())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// DecodedWaveform
// ---------------------------------------------------------------------------

/// A waveform read back out of a canonical container.
#[derive(Debug, Clone)]
pub struct DecodedWaveform {
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_derived_from_frame_count() {
        let artifact = encode_wav(&vec![0.0_f32; 48_000], 48_000, 1).unwrap();
        assert_eq!(artifact.frame_count(), 48_000);
        assert_eq!(artifact.duration(), Duration::from_secs(1));
    }

    #[test]
    fn from_wav_bytes_round_trips_metadata() {
        let artifact = encode_wav(&[0.25_f32; 960], 48_000, 1).unwrap();
        let rebuilt = EncodedAudioArtifact::from_wav_bytes(artifact.bytes().to_vec()).unwrap();
        assert_eq!(rebuilt.sample_rate(), 48_000);
        assert_eq!(rebuilt.channels(), 1);
        assert_eq!(rebuilt.frame_count(), 960);
        assert_eq!(rebuilt.bytes(), artifact.bytes());
    }

    #[test]
    fn from_wav_bytes_rejects_garbage() {
        assert!(EncodedAudioArtifact::from_wav_bytes(vec![0u8; 16]).is_err());
    }

    #[test]
    fn clones_share_bytes() {
        let artifact = encode_wav(&[0.0_f32; 4], 48_000, 1).unwrap();
        let clone = artifact.clone();
        assert!(Arc::ptr_eq(&artifact.shared_bytes(), &clone.shared_bytes()));
    }
}
