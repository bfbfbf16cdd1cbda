//! Audio input — microphone capture → frame channel → bounded buffer.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → Vec<f32> frame (mpsc) → SampleFrameBuffer
//!            → viz (live snapshot) / codec (encode on stop)
//! ```
//!
//! The capture callback runs on a real-time thread outside application
//! control; it only forwards frames.  The drain side appends them to a
//! [`SampleFrameBuffer`] shared with the renderer.

pub mod buffer;
pub mod capture;

pub use buffer::{SampleFrameBuffer, CAPACITY};
pub use capture::{CaptureSource, DeviceError, MicSource, SourceHandle, CHANNELS, SAMPLE_RATE};
