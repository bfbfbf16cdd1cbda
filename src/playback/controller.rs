//! Playback of the encoded artifact via rodio.
//!
//! The controller lives on the UI thread (the rodio output stream is not
//! `Send`).  The app polls [`PlaybackController::poll`] at ~20 Hz while
//! playing; the returned [`PlaybackState`] drives the static waveform
//! cursor.
//!
//! Playback failures (no output device, platform refusal) are reported as
//! [`PlaybackError`] and never affect capture state.

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;

use crate::codec::EncodedAudioArtifact;

use super::clock::PlaybackClock;

// ---------------------------------------------------------------------------
// PlaybackError / PlaybackState
// ---------------------------------------------------------------------------

/// Errors surfaced by playback and export.  Reported, not fatal.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no recording is loaded")]
    NoArtifact,

    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("could not decode recording for playback: {0}")]
    Decode(String),

    #[error("failed to write WAV file: {0}")]
    Export(String),
}

/// Snapshot of the playback position, refreshed by [`PlaybackController::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub position: Duration,
    pub duration: Duration,
    pub is_playing: bool,
}

impl PlaybackState {
    /// Cursor position as a fraction of the duration, in `[0, 1]`.
    pub fn cursor_frac(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Plays the current artifact and reports position.
///
/// The output device is opened lazily on the first [`toggle`](Self::toggle)
/// so a machine without speakers can still capture and export.
pub struct PlaybackController {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    clock: PlaybackClock,
    artifact: Option<EncodedAudioArtifact>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            output: None,
            sink: None,
            clock: PlaybackClock::new(),
            artifact: None,
        }
    }

    /// Replace the loaded artifact.  Playback state is reset whenever the
    /// artifact changes.
    pub fn load(&mut self, artifact: EncodedAudioArtifact) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.clock.reset();
        self.artifact = Some(artifact);
    }

    /// Drop the loaded artifact and reset state.
    pub fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.clock.reset();
        self.artifact = None;
    }

    pub fn artifact(&self) -> Option<&EncodedAudioArtifact> {
        self.artifact.as_ref()
    }

    /// Play when paused, pause when playing.
    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        let artifact = self.artifact.as_ref().ok_or(PlaybackError::NoArtifact)?;

        if self.clock.is_running() {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.clock.pause();
            return Ok(());
        }

        // Replay from the start once the previous run finished.
        if self.clock.position() >= artifact.duration() {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            self.clock.reset();
        }

        if let Some(sink) = &self.sink {
            sink.play();
        } else {
            self.ensure_output()?;
            let handle = &self.output.as_ref().expect("just initialised").1;
            let sink = Sink::try_new(handle).map_err(|e| PlaybackError::Output(e.to_string()))?;

            let artifact = self.artifact.as_ref().expect("checked above");
            let source = Decoder::new_wav(Cursor::new(artifact.shared_bytes()))
                .map_err(|e| PlaybackError::Decode(e.to_string()))?;
            sink.append(source);

            let resume_at = self.clock.position();
            if !resume_at.is_zero() {
                // Seek support varies by backend; the clock stays accurate
                // either way.
                if let Err(e) = sink.try_seek(resume_at) {
                    log::warn!("playback: seek to {resume_at:?} unsupported: {e}");
                }
            }
            sink.play();
            self.sink = Some(sink);
        }

        self.clock.play();
        Ok(())
    }

    /// Jump to `position` (clamped to the artifact duration).
    pub fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        let artifact = self.artifact.as_ref().ok_or(PlaybackError::NoArtifact)?;
        let position = position.min(artifact.duration());

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.try_seek(position) {
                log::warn!("playback: seek unsupported: {e}");
            }
        }
        self.clock.seek(position);
        Ok(())
    }

    /// Refresh and return the playback state.  Detects end-of-artifact and
    /// parks the cursor at the end.
    pub fn poll(&mut self) -> PlaybackState {
        let duration = self
            .artifact
            .as_ref()
            .map(|a| a.duration())
            .unwrap_or_default();

        let mut position = self.clock.position();
        if self.clock.is_running() && position >= duration {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
            self.clock.pause();
            self.clock.seek(duration);
            position = duration;
        }

        PlaybackState {
            position: position.min(duration),
            duration,
            is_playing: self.clock.is_running(),
        }
    }

    /// Write the artifact's canonical WAV bytes to `path`.
    ///
    /// The stored artifact is read, never mutated; repeated exports produce
    /// identical files.
    pub fn export_wav(&self, path: &Path) -> Result<(), PlaybackError> {
        let artifact = self.artifact.as_ref().ok_or(PlaybackError::NoArtifact)?;
        std::fs::write(path, artifact.bytes()).map_err(|e| PlaybackError::Export(e.to_string()))
    }

    fn ensure_output(&mut self) -> Result<(), PlaybackError> {
        if self.output.is_none() {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| PlaybackError::Output(e.to_string()))?;
            self.output = Some((stream, handle));
        }
        Ok(())
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests (device-free paths only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_wav;

    fn one_second_artifact() -> EncodedAudioArtifact {
        encode_wav(&vec![0.1_f32; 48_000], 48_000, 1).unwrap()
    }

    #[test]
    fn toggle_without_artifact_is_an_error() {
        let mut playback = PlaybackController::new();
        assert!(matches!(
            playback.toggle(),
            Err(PlaybackError::NoArtifact)
        ));
    }

    #[test]
    fn seek_without_artifact_is_an_error() {
        let mut playback = PlaybackController::new();
        assert!(matches!(
            playback.seek(Duration::from_secs(1)),
            Err(PlaybackError::NoArtifact)
        ));
    }

    #[test]
    fn load_resets_playback_state() {
        let mut playback = PlaybackController::new();
        playback.load(one_second_artifact());

        let state = playback.poll();
        assert_eq!(state.position, Duration::ZERO);
        assert_eq!(state.duration, Duration::from_secs(1));
        assert!(!state.is_playing);
    }

    #[test]
    fn seek_is_clamped_to_duration() {
        let mut playback = PlaybackController::new();
        playback.load(one_second_artifact());

        playback.seek(Duration::from_secs(10)).unwrap();
        let state = playback.poll();
        assert_eq!(state.position, Duration::from_secs(1));
        assert_eq!(state.cursor_frac(), 1.0);
    }

    #[test]
    fn cursor_frac_of_empty_state_is_zero() {
        assert_eq!(PlaybackState::default().cursor_frac(), 0.0);
    }

    #[test]
    fn export_writes_the_exact_artifact_bytes() {
        let mut playback = PlaybackController::new();
        let artifact = one_second_artifact();
        let expected = artifact.bytes().to_vec();
        playback.load(artifact);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");
        playback.export_wav(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), expected);

        // Export again — the stored artifact must be unchanged.
        playback.export_wav(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn export_without_artifact_is_an_error() {
        let playback = PlaybackController::new();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            playback.export_wav(&dir.path().join("x.wav")),
            Err(PlaybackError::NoArtifact)
        ));
    }

    #[test]
    fn unload_clears_the_artifact() {
        let mut playback = PlaybackController::new();
        playback.load(one_second_artifact());
        playback.unload();
        assert!(playback.artifact().is_none());
        assert_eq!(playback.poll().duration, Duration::ZERO);
    }
}
