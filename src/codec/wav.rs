//! WAV encode / decode and the PCM quantization rule.
//!
//! [`encode_wav`] is a pure function from a decoded waveform to the
//! canonical container: `hound` writes the classic 44-byte header (RIFF
//! size, `fmt ` block of 16, PCM format tag 1, little-endian throughout)
//! and we quantize each `f32` sample ourselves so the payload is bit-exact:
//!
//! ```text
//! clamp(s, -1.0, 1.0)  →  s < 0 ? s × 32768 : s × 32767
//! ```
//!
//! The asymmetric scaling matches the signed 16-bit range
//! `[-32768, 32767]`; full-scale `1.0` encodes as `0x7FFF` and `-1.0` as
//! `0x8000`.
//!
//! # Example
//!
//! ```rust
//! use auscult::codec::{encode_wav, quantize};
//!
//! assert_eq!(quantize(1.0), i16::MAX);
//! assert_eq!(quantize(-1.0), i16::MIN);
//!
//! let artifact = encode_wav(&[0.0, 0.5, -0.5], 48_000, 1).unwrap();
//! assert_eq!(artifact.bytes().len(), 44 + 3 * 2);
//! ```

use std::io::Cursor;

use super::{DecodeError, DecodedWaveform, EncodeError, EncodedAudioArtifact};

/// Bits per sample in the canonical container.
const BITS_PER_SAMPLE: u16 = 16;

// ---------------------------------------------------------------------------
// Quantization
// ---------------------------------------------------------------------------

/// Quantize one float sample to signed 16-bit PCM.
///
/// Input is clamped to `[-1.0, 1.0]`; negative and positive halves scale by
/// 32768 and 32767 respectively so the full i16 range is reachable.
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Inverse of [`quantize`], up to the 1/32768 quantization step.
pub fn dequantize(value: i16) -> f32 {
    if value < 0 {
        f32::from(value) / 32768.0
    } else {
        f32::from(value) / 32767.0
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encode an interleaved `f32` waveform into a canonical WAV artifact.
///
/// Deterministic: identical input always yields identical bytes.
///
/// # Errors
///
/// [`EncodeError::InvalidLayout`] when `channels == 0` or the sample count
/// is not a whole number of frames; [`EncodeError::Write`] when the
/// container writer fails.
pub fn encode_wav(
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<EncodedAudioArtifact, EncodeError> {
    if channels == 0 {
        return Err(EncodeError::InvalidLayout("channel count is zero".into()));
    }
    if samples.len() % channels as usize != 0 {
        return Err(EncodeError::InvalidLayout(format!(
            "{} samples do not form whole {}-channel frames",
            samples.len(),
            channels
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut bytes: Vec<u8> = Vec::with_capacity(44 + samples.len() * 2);
    {
        let cursor = Cursor::new(&mut bytes);
        let mut writer = hound::WavWriter::new(cursor, spec)?;
        for &sample in samples {
            writer.write_sample(quantize(sample))?;
        }
        writer.finalize()?;
    }

    let frame_count = (samples.len() / channels as usize) as u32;
    Ok(EncodedAudioArtifact::from_parts(
        bytes,
        sample_rate,
        channels,
        frame_count,
    ))
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode canonical WAV bytes back into an `f32` waveform.
///
/// Accepts only the 16-bit integer PCM layout this crate produces.
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedWaveform, DecodeError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != BITS_PER_SAMPLE {
        return Err(DecodeError::UnsupportedLayout(format!(
            "expected {BITS_PER_SAMPLE}-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(dequantize))
        .collect::<Result<Vec<f32>, hound::Error>>()?;

    Ok(DecodedWaveform {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
