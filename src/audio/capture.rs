//! Microphone capture via `cpal`.
//!
//! Capture is fixed at [`SAMPLE_RATE`] Hz mono: the stream config is
//! requested explicitly rather than taken from the device default, and cpal
//! hands over the unprocessed device signal — no echo cancellation, noise
//! suppression, or gain control is applied anywhere between the microphone
//! and the frame channel.
//!
//! The cpal stream is `!Send`, so [`MicSource`] keeps it on a dedicated
//! thread.  The cpal callback does one thing: forward each hardware buffer
//! as an owned frame over an mpsc channel.  Everything else (buffering,
//! decimation, encoding) happens on the cooperative side.
//!
//! [`CaptureSource`] is the seam the session controller is written against;
//! tests substitute an in-memory source and never touch hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

/// Fixed capture sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Fixed capture channel count.
pub const CHANNELS: u16 = 1;

// ---------------------------------------------------------------------------
// DeviceError
// ---------------------------------------------------------------------------

/// Errors raised while acquiring or controlling the input device.
///
/// These are user-facing: permission or hardware problems cannot be retried
/// without external action.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no audio input device available (check microphone permission)")]
    NoDevice,

    #[error("failed to open {CHANNELS} ch / {SAMPLE_RATE} Hz input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture thread unavailable: {0}")]
    Thread(String),
}

// ---------------------------------------------------------------------------
// CaptureSource / SourceHandle
// ---------------------------------------------------------------------------

/// Something that can produce a stream of raw capture frames.
///
/// The session controller owns a `Box<dyn CaptureSource>`; the production
/// implementation is [`MicSource`], tests provide their own.
pub trait CaptureSource: Send {
    /// Acquire the device and start delivering frames to `tx`.
    ///
    /// Blocks until the stream is live (or has failed) so the caller knows
    /// exactly when the acquisition phase ends.
    fn open(&mut self, tx: mpsc::Sender<Vec<f32>>) -> Result<Box<dyn SourceHandle>, DeviceError>;
}

/// Handle to one live stream produced by [`CaptureSource::open`].
///
/// Dropping the handle halts the stream — a live microphone must never
/// outlive its session.
pub trait SourceHandle: Send {
    /// Stop the stream and release the device.  Idempotent.
    fn halt(&mut self) -> Result<(), DeviceError>;

    /// Returns `true` while the underlying stream is live.
    fn is_live(&self) -> bool;
}

// ---------------------------------------------------------------------------
// MicSource
// ---------------------------------------------------------------------------

/// Production [`CaptureSource`] backed by the default cpal input device.
pub struct MicSource;

impl MicSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MicSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for MicSource {
    fn open(&mut self, tx: mpsc::Sender<Vec<f32>>) -> Result<Box<dyn SourceHandle>, DeviceError> {
        let live = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), DeviceError>>();
        let (halt_tx, halt_rx) = mpsc::channel::<()>();

        let live_thread = Arc::clone(&live);
        // Detached; the thread exits when the handle halts it.
        let _thread = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let stream = match open_stream(tx) {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                live_thread.store(true, Ordering::SeqCst);
                let _ = ready_tx.send(Ok(()));

                // Park until halted; a closed channel (handle dropped) counts.
                let _ = halt_rx.recv();

                drop(stream);
                live_thread.store(false, Ordering::SeqCst);
                log::debug!("capture: stream released");
            })
            .map_err(|e| DeviceError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(MicHandle {
                halt_tx: Some(halt_tx),
                live,
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DeviceError::Thread(
                "capture thread exited during startup".into(),
            )),
        }
    }
}

/// Build and start the fixed-config input stream.  Runs on the capture
/// thread; the returned stream must be dropped on that same thread.
fn open_stream(tx: mpsc::Sender<Vec<f32>>) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(DeviceError::NoDevice)?;

    log::info!("capture: using input device {:?}", device.name());

    let config = cpal::StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Forward only; the real-time thread never buffers or renders.
            // A send error means the session side is gone and the frame is
            // dropped.
            let _ = tx.send(data.to_vec());
        },
        |err: cpal::StreamError| {
            log::error!("capture: stream error: {err}");
        },
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

// ---------------------------------------------------------------------------
// MicHandle
// ---------------------------------------------------------------------------

struct MicHandle {
    halt_tx: Option<mpsc::Sender<()>>,
    live: Arc<AtomicBool>,
}

impl SourceHandle for MicHandle {
    fn halt(&mut self) -> Result<(), DeviceError> {
        // Dropping the sender unparks the capture thread; if it is already
        // gone the stream is already released.
        if let Some(tx) = self.halt_tx.take() {
            drop(tx);
        }
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for MicHandle {
    fn drop(&mut self) {
        let _ = self.halt();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// The controller moves sources and handles across tasks.
    #[test]
    fn source_and_handle_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MicSource>();
        assert_send::<Box<dyn SourceHandle>>();
    }

    #[test]
    fn fixed_config_constants() {
        assert_eq!(SAMPLE_RATE, 48_000);
        assert_eq!(CHANNELS, 1);
    }
}
