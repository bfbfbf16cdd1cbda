//! Pause-aware playback position clock.
//!
//! rodio's sink does not report a position on every platform path we care
//! about, so position comes from a monotonic clock that accumulates play
//! time across pause/resume/seek.  The clock is independent of any output
//! device, which also makes position reporting testable headlessly.

use std::time::{Duration, Instant};

/// Tracks the current playback position.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    /// Position accumulated up to the last pause/seek.
    base: Duration,
    /// Set while running; `position()` adds the live elapsed time.
    playing_since: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) advancing.  No-op when already running.
    pub fn play(&mut self) {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }

    /// Freeze the position.  No-op when already paused.
    pub fn pause(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.base += since.elapsed();
        }
    }

    /// Jump to `position`, preserving the running/paused state.
    pub fn seek(&mut self, position: Duration) {
        self.base = position;
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    /// Reset to zero, paused.
    pub fn reset(&mut self) {
        self.base = Duration::ZERO;
        self.playing_since = None;
    }

    /// Current position.
    pub fn position(&self) -> Duration {
        self.base
            + self
                .playing_since
                .map(|since| since.elapsed())
                .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.playing_since.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
