//! Artifact playback — rodio sink + pause-aware position clock.

pub mod clock;
pub mod controller;

pub use clock::PlaybackClock;
pub use controller::{PlaybackController, PlaybackError, PlaybackState};
