//! Capture session states, commands, events and errors.
//!
//! [`CaptureState`] drives the controller's state machine.  The UI mirrors
//! it from [`SessionEvent`]s received over the event channel.
//!
//! The transitions are:
//!
//! ```text
//! Idle ──start──▶ Acquiring ──stream live──▶ Recording
//!                           ──device fail──▶ Error
//! Recording ──tick reaches target──▶ Stopping     (normal stop)
//!           ──hard deadline───────▶ Stopping     (forced stop)
//!           ──stop command────────▶ Stopping
//! Stopping ──frames flushed──▶ Processing ──encode ok──▶ Idle (+ artifact)
//!                                         ──encode err─▶ Error
//! Stopping ──zero samples────▶ Error
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::audio::DeviceError;
use crate::codec::EncodedAudioArtifact;

// ---------------------------------------------------------------------------
// CaptureState
// ---------------------------------------------------------------------------

/// States of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No session; a completed artifact may be held by the app.
    Idle,
    /// The device stream is being opened.
    Acquiring,
    /// Frames are flowing into the sample buffer.
    Recording,
    /// Timers cancelled, stream halting, final frames flushing.
    Stopping,
    /// Accumulated frames are being encoded.
    Processing,
    /// The session failed; a new one may be started.
    Error,
}

impl CaptureState {
    /// Returns `true` while a session holds the device or its data.
    ///
    /// At most one session may be active at any time; `Start` while active
    /// force-stops the previous session first.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CaptureState::Acquiring
                | CaptureState::Recording
                | CaptureState::Stopping
                | CaptureState::Processing
        )
    }

    /// Short label for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::Acquiring => "Acquiring",
            CaptureState::Recording => "Recording",
            CaptureState::Stopping => "Stopping",
            CaptureState::Processing => "Processing",
            CaptureState::Error => "Error",
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        CaptureState::Idle
    }
}

// ---------------------------------------------------------------------------
// ClipDuration
// ---------------------------------------------------------------------------

/// The recognized capture durations — the only targets callers can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipDuration {
    S5,
    S10,
    S15,
    S30,
}

impl ClipDuration {
    pub const ALL: [ClipDuration; 4] = [
        ClipDuration::S5,
        ClipDuration::S10,
        ClipDuration::S15,
        ClipDuration::S30,
    ];

    pub fn as_secs(self) -> u64 {
        match self {
            ClipDuration::S5 => 5,
            ClipDuration::S10 => 10,
            ClipDuration::S15 => 15,
            ClipDuration::S30 => 30,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }

    /// Parse a configured value; anything outside the recognized set is
    /// rejected.
    pub fn from_secs(secs: u64) -> Option<Self> {
        match secs {
            5 => Some(ClipDuration::S5),
            10 => Some(ClipDuration::S10),
            15 => Some(ClipDuration::S15),
            30 => Some(ClipDuration::S30),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClipDuration::S5 => "5 s",
            ClipDuration::S10 => "10 s",
            ClipDuration::S15 => "15 s",
            ClipDuration::S30 => "30 s",
        }
    }
}

impl Default for ClipDuration {
    fn default() -> Self {
        ClipDuration::S10
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors a capture session can end with.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Permission denied or no usable device.  Not retryable until the user
    /// grants access.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The session stopped with zero captured samples.
    #[error("No audio data was captured.")]
    NoDataCaptured,

    /// Encoding the accumulated frames failed; the artifact is discarded.
    #[error("audio encoding failed: {0}")]
    Encoding(String),
}

impl CaptureError {
    /// Whether starting a fresh session can succeed without external action.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CaptureError::Device(_))
    }
}

// ---------------------------------------------------------------------------
// Commands / events
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the capture controller.
#[derive(Debug, Clone, Copy)]
pub enum CaptureCommand {
    /// Begin a new session.  Force-stops any active session first.
    Start { target: ClipDuration },
    /// Stop the active session.  No-op when none is active.
    Stop,
}

/// Events delivered from the controller back to the UI.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(CaptureState),
    /// Recording progress (sent on each cooperative tick, lossy).
    Progress { elapsed: Duration, target: Duration },
    /// The session produced its artifact and returned to `Idle`.
    Completed(EncodedAudioArtifact),
    /// The session ended in `Error`.
    Failed { message: String, retryable: bool },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
