//! Capture controller — owns the session lifecycle, the device stream and
//! the dual-timer auto-stop mechanism.
//!
//! # Timing
//!
//! Two independent mechanisms run while `Recording`:
//!
//! * a cooperative tick (period [`CaptureTiming::tick`], 100 ms) that
//!   updates the elapsed time and issues a normal stop exactly when
//!   `elapsed ≥ target`;
//! * a hard deadline sleep at `target + grace` (grace 500 ms) that forces a
//!   stop unconditionally.
//!
//! Cooperative timers can be starved; the hard deadline is authoritative and
//! bounds every session.  Both paths call the same idempotent stop routine,
//! and a normal stop cancels the deadline (the timers die with the session).
//!
//! # Ownership
//!
//! The controller task is the single writer of session state.  The device
//! stream is owned by the active session; frames flow callback → channel →
//! drain thread → shared [`SampleFrameBuffer`], and transfer to the encoder
//! only after the session has fully stopped.

use std::pin::Pin;
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Instant, Interval, MissedTickBehavior, Sleep};

use crate::audio::{CaptureSource, SampleFrameBuffer, SourceHandle, CHANNELS, SAMPLE_RATE};
use crate::codec;

use super::state::{CaptureCommand, CaptureError, CaptureState, ClipDuration, SessionEvent};

// ---------------------------------------------------------------------------
// Shared buffer / timing
// ---------------------------------------------------------------------------

/// Frame buffer shared between the capture drain thread and the renderer.
///
/// The renderer only ever calls `snapshot()` under a short lock; it never
/// holds a view into live storage.
pub type SharedFrameBuffer = Arc<Mutex<SampleFrameBuffer>>;

/// Construct a fresh shared buffer with the default capacity.
pub fn new_shared_buffer() -> SharedFrameBuffer {
    Arc::new(Mutex::new(SampleFrameBuffer::new()))
}

/// Timer periods for the dual-timer mechanism.
#[derive(Debug, Clone, Copy)]
pub struct CaptureTiming {
    /// Cooperative tick period.
    pub tick: Duration,
    /// Extra time granted past the target before the hard deadline fires.
    pub grace: Duration,
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            grace: Duration::from_millis(500),
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureController
// ---------------------------------------------------------------------------

/// Drives the capture lifecycle.  Create with [`CaptureController::new`],
/// then spawn [`run`](Self::run) as a tokio task.
pub struct CaptureController {
    source: Box<dyn CaptureSource>,
    buffer: SharedFrameBuffer,
    event_tx: mpsc::Sender<SessionEvent>,
    timing: CaptureTiming,
    state: CaptureState,
    active: Option<ActiveSession>,
}

/// Per-session resources.  Dropping this cancels both timers.
struct ActiveSession {
    target: Duration,
    started_at: Instant,
    elapsed: Duration,
    tick: Interval,
    deadline: Pin<Box<Sleep>>,
    handle: Box<dyn SourceHandle>,
    drain: Option<thread::JoinHandle<()>>,
}

/// Which of the three wakeup sources fired first.
enum Wake {
    Cmd(Option<CaptureCommand>),
    Tick,
    Deadline,
}

impl CaptureController {
    pub fn new(
        source: Box<dyn CaptureSource>,
        buffer: SharedFrameBuffer,
        event_tx: mpsc::Sender<SessionEvent>,
        timing: CaptureTiming,
    ) -> Self {
        Self {
            source,
            buffer,
            event_tx,
            timing,
            state: CaptureState::Idle,
            active: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until the command channel closes.
    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<CaptureCommand>) {
        loop {
            let wake = if let Some(session) = self.active.as_mut() {
                tokio::select! {
                    cmd = cmd_rx.recv() => Wake::Cmd(cmd),
                    _ = session.tick.tick() => Wake::Tick,
                    _ = session.deadline.as_mut() => Wake::Deadline,
                }
            } else {
                Wake::Cmd(cmd_rx.recv().await)
            };

            match wake {
                Wake::Cmd(Some(CaptureCommand::Start { target })) => {
                    if self.active.is_some() {
                        log::info!("session: restart requested — force-stopping active session");
                        self.finish_session().await;
                    }
                    self.start_session(target).await;
                }
                Wake::Cmd(Some(CaptureCommand::Stop)) => {
                    // Idempotent: a no-op when nothing is recording.
                    self.finish_session().await;
                }
                Wake::Cmd(None) => {
                    self.finish_session().await;
                    log::info!("session: command channel closed, controller shutting down");
                    break;
                }
                Wake::Tick => self.on_tick().await,
                Wake::Deadline => {
                    log::warn!("session: hard deadline fired — forcing stop");
                    self.finish_session().await;
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Session start
    // -----------------------------------------------------------------------

    async fn start_session(&mut self, target: ClipDuration) {
        self.set_state(CaptureState::Acquiring).await;

        // Leftover frames from a previous session must never leak into this
        // one.
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let (frame_tx, frame_rx) = std_mpsc::channel::<Vec<f32>>();

        let handle = match self.source.open(frame_tx) {
            Ok(h) => h,
            Err(e) => {
                self.fail(CaptureError::Device(e)).await;
                return;
            }
        };

        // Drain thread: moves frames from the capture channel into the
        // shared buffer.  Exits once every producer is gone.
        let buffer = Arc::clone(&self.buffer);
        let drain = thread::Builder::new()
            .name("frame-drain".into())
            .spawn(move || {
                while let Ok(frame) = frame_rx.recv() {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push(frame);
                    }
                }
            });

        let drain = match drain {
            Ok(join) => Some(join),
            Err(e) => {
                let mut handle = handle;
                if let Err(halt_err) = handle.halt() {
                    log::warn!("session: stream halt after spawn failure: {halt_err}");
                }
                self.fail(CaptureError::Device(crate::audio::DeviceError::Thread(
                    e.to_string(),
                )))
                .await;
                return;
            }
        };

        let target = target.duration();
        let mut tick = interval(self.timing.tick);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.active = Some(ActiveSession {
            target,
            started_at: Instant::now(),
            elapsed: Duration::ZERO,
            tick,
            deadline: Box::pin(sleep(target + self.timing.grace)),
            handle,
            drain,
        });
        self.set_state(CaptureState::Recording).await;
    }

    // -----------------------------------------------------------------------
    // Cooperative tick
    // -----------------------------------------------------------------------

    async fn on_tick(&mut self) {
        let (elapsed, target) = {
            let Some(session) = self.active.as_mut() else {
                return;
            };
            session.elapsed = session.started_at.elapsed();
            (session.elapsed, session.target)
        };

        // Lossy: a full event channel must not stall the stop decision.
        let _ = self
            .event_tx
            .try_send(SessionEvent::Progress { elapsed, target });

        if elapsed >= target {
            self.finish_session().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop + completion
    // -----------------------------------------------------------------------

    /// The single stop routine used by the stop command, the cooperative
    /// tick, the hard deadline, and restart.  Idempotent; every teardown
    /// step is best-effort so one failure cannot block the others.
    async fn finish_session(&mut self) {
        let Some(mut session) = self.active.take() else {
            return;
        };

        self.set_state(CaptureState::Stopping).await;

        // Timers are owned by `session` and die with it below.

        // Halt the recorder stream.
        if let Err(e) = session.handle.halt() {
            log::warn!("session: stream halt failed: {e}");
        }

        // Flush the final frames: with the producer gone the drain thread
        // appends whatever is still queued, then exits.
        if let Some(join) = session.drain.take() {
            match tokio::task::spawn_blocking(move || join.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => log::warn!("session: frame drain thread panicked"),
                Err(e) => log::warn!("session: failed to join frame drain: {e}"),
            }
        }

        // Release the device handle.
        drop(session.handle);

        let samples = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take_all();

        if samples.is_empty() {
            self.fail(CaptureError::NoDataCaptured).await;
            return;
        }

        self.set_state(CaptureState::Processing).await;

        let encoded =
            tokio::task::spawn_blocking(move || codec::encode_wav(&samples, SAMPLE_RATE, CHANNELS))
                .await;

        match encoded {
            Ok(Ok(artifact)) => {
                log::info!(
                    "session: encoded {} frames ({:?})",
                    artifact.frame_count(),
                    artifact.duration()
                );
                self.set_state(CaptureState::Idle).await;
                let _ = self.event_tx.send(SessionEvent::Completed(artifact)).await;
            }
            Ok(Err(e)) => self.fail(CaptureError::Encoding(e.to_string())).await,
            Err(e) => self.fail(CaptureError::Encoding(e.to_string())).await,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn set_state(&mut self, state: CaptureState) {
        if self.state != state {
            self.state = state;
            let _ = self
                .event_tx
                .send(SessionEvent::StateChanged(state))
                .await;
        }
    }

    async fn fail(&mut self, error: CaptureError) {
        log::error!("session: {error}");
        self.set_state(CaptureState::Error).await;
        let _ = self
            .event_tx
            .send(SessionEvent::Failed {
                message: error.to_string(),
                retryable: error.is_retryable(),
            })
            .await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DeviceError;
    use std::sync::atomic::{AtomicBool, Ordering};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// In-memory capture source.  Delivers its frames immediately on open
    /// and tracks the liveness of every handle it has produced.
    struct MockSource {
        frames: Vec<Vec<f32>>,
        fail_open: bool,
        halt_fails: bool,
        handles: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    }

    impl MockSource {
        fn with_frames(frames: Vec<Vec<f32>>) -> Self {
            Self {
                frames,
                fail_open: false,
                halt_fails: false,
                handles: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn handles(&self) -> Arc<Mutex<Vec<Arc<AtomicBool>>>> {
            Arc::clone(&self.handles)
        }
    }

    impl CaptureSource for MockSource {
        fn open(
            &mut self,
            tx: std_mpsc::Sender<Vec<f32>>,
        ) -> Result<Box<dyn SourceHandle>, DeviceError> {
            if self.fail_open {
                return Err(DeviceError::NoDevice);
            }
            for frame in &self.frames {
                let _ = tx.send(frame.clone());
            }
            let live = Arc::new(AtomicBool::new(true));
            self.handles.lock().unwrap().push(Arc::clone(&live));
            Ok(Box::new(MockHandle {
                live,
                halt_fails: self.halt_fails,
            }))
        }
    }

    struct MockHandle {
        live: Arc<AtomicBool>,
        halt_fails: bool,
    }

    impl SourceHandle for MockHandle {
        fn halt(&mut self) -> Result<(), DeviceError> {
            if self.halt_fails {
                return Err(DeviceError::Thread("synthetic halt failure".into()));
            }
            self.live.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    impl Drop for MockHandle {
        fn drop(&mut self) {
            // Device release happens even when halt failed.
            self.live.store(false, Ordering::SeqCst);
        }
    }

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    fn spawn_controller(
        source: MockSource,
        timing: CaptureTiming,
    ) -> (
        mpsc::Sender<CaptureCommand>,
        mpsc::Receiver<SessionEvent>,
        SharedFrameBuffer,
    ) {
        let buffer = new_shared_buffer();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(256);
        let controller =
            CaptureController::new(Box::new(source), Arc::clone(&buffer), event_tx, timing);
        tokio::spawn(controller.run(cmd_rx));
        (cmd_tx, event_rx, buffer)
    }

    /// Await events until the given state is observed.
    async fn wait_for_state(rx: &mut mpsc::Receiver<SessionEvent>, wanted: CaptureState) {
        while let Some(event) = rx.recv().await {
            if matches!(event, SessionEvent::StateChanged(s) if s == wanted) {
                return;
            }
        }
        panic!("event channel closed before reaching {wanted:?}");
    }

    /// Await events until the session completes or fails.
    async fn wait_for_outcome(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Completed(_) | SessionEvent::Failed { .. } => return event,
                _ => {}
            }
        }
        panic!("event channel closed before an outcome");
    }

    fn frames_of_silence(count: usize) -> Vec<Vec<f32>> {
        vec![vec![0.25_f32; 480]; count]
    }

    /// A tick period so long it never fires within a session — simulates a
    /// starved cooperative timer.
    fn stalled_timing() -> CaptureTiming {
        CaptureTiming {
            tick: Duration::from_secs(10_000),
            grace: Duration::from_millis(500),
        }
    }

    // -----------------------------------------------------------------------
    // Hard deadline (dual-timer) properties
    // -----------------------------------------------------------------------

    /// With the cooperative tick stalled, the hard deadline must still
    /// terminate the session within `target + grace` for every recognized
    /// duration.
    #[tokio::test(start_paused = true)]
    async fn hard_deadline_bounds_every_duration_with_stalled_tick() {
        for target in ClipDuration::ALL {
            let source = MockSource::with_frames(frames_of_silence(4));
            let (cmd_tx, mut event_rx, _buffer) = spawn_controller(source, stalled_timing());

            cmd_tx
                .send(CaptureCommand::Start { target })
                .await
                .unwrap();
            wait_for_state(&mut event_rx, CaptureState::Recording).await;
            let recording_started = Instant::now();

            wait_for_state(&mut event_rx, CaptureState::Processing).await;
            let took = recording_started.elapsed();

            let bound = target.duration() + Duration::from_millis(500);
            assert!(
                took <= bound + Duration::from_millis(50),
                "target {target:?}: took {took:?}, bound {bound:?}"
            );
            assert!(
                took >= target.duration(),
                "target {target:?}: stopped early at {took:?}"
            );

            match wait_for_outcome(&mut event_rx).await {
                SessionEvent::Completed(artifact) => assert!(artifact.frame_count() > 0),
                other => panic!("expected artifact, got {other:?}"),
            }
        }
    }

    /// With a healthy tick, the normal stop fires at the target — before the
    /// hard deadline — and cancels it.
    #[tokio::test(start_paused = true)]
    async fn cooperative_tick_stops_at_target() {
        let source = MockSource::with_frames(frames_of_silence(4));
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S5,
            })
            .await
            .unwrap();
        wait_for_state(&mut event_rx, CaptureState::Recording).await;
        let recording_started = Instant::now();

        wait_for_state(&mut event_rx, CaptureState::Processing).await;
        let took = recording_started.elapsed();

        assert!(took >= Duration::from_secs(5), "stopped early: {took:?}");
        assert!(
            took < Duration::from_millis(5_400),
            "normal stop did not beat the hard deadline: {took:?}"
        );
    }

    // -----------------------------------------------------------------------
    // Zero-data and device failures
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn zero_byte_capture_ends_in_error_with_exact_message() {
        let source = MockSource::with_frames(Vec::new());
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S5,
            })
            .await
            .unwrap();

        match wait_for_outcome(&mut event_rx).await {
            SessionEvent::Failed { message, retryable } => {
                assert_eq!(message, "No audio data was captured.");
                assert!(retryable);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn device_failure_is_reported_and_not_retryable() {
        let mut source = MockSource::with_frames(Vec::new());
        source.fail_open = true;
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S10,
            })
            .await
            .unwrap();

        match wait_for_outcome(&mut event_rx).await {
            SessionEvent::Failed { message, retryable } => {
                assert!(message.contains("input device"), "message: {message}");
                assert!(!retryable);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Single-session and teardown guarantees
    // -----------------------------------------------------------------------

    /// Restarting while recording leaves exactly one active session and the
    /// prior session's stream is no longer live.
    #[tokio::test(start_paused = true)]
    async fn restart_leaves_exactly_one_live_stream() {
        let source = MockSource::with_frames(frames_of_silence(2));
        let handles = source.handles();
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S30,
            })
            .await
            .unwrap();
        wait_for_state(&mut event_rx, CaptureState::Recording).await;

        // Second start: the first session is force-stopped, then a new one
        // acquires the device.
        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S30,
            })
            .await
            .unwrap();

        // First session winds down and completes, second reaches Recording.
        match wait_for_outcome(&mut event_rx).await {
            SessionEvent::Completed(_) => {}
            other => panic!("expected first session's artifact, got {other:?}"),
        }
        wait_for_state(&mut event_rx, CaptureState::Recording).await;

        {
            let handles = handles.lock().unwrap();
            assert_eq!(handles.len(), 2);
            assert!(!handles[0].load(Ordering::SeqCst), "old stream still live");
            assert!(handles[1].load(Ordering::SeqCst), "new stream not live");
        }

        cmd_tx.send(CaptureCommand::Stop).await.unwrap();
        wait_for_outcome(&mut event_rx).await;
        let handles = handles.lock().unwrap();
        assert!(handles.iter().all(|h| !h.load(Ordering::SeqCst)));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let source = MockSource::with_frames(frames_of_silence(2));
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        // Stop with no session: silently ignored.
        cmd_tx.send(CaptureCommand::Stop).await.unwrap();

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S10,
            })
            .await
            .unwrap();
        wait_for_state(&mut event_rx, CaptureState::Recording).await;

        cmd_tx.send(CaptureCommand::Stop).await.unwrap();
        cmd_tx.send(CaptureCommand::Stop).await.unwrap();
        drop(cmd_tx);

        // Exactly one artifact for the whole exchange.
        let mut completed = 0;
        while let Some(event) = event_rx.recv().await {
            if matches!(event, SessionEvent::Completed(_)) {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
    }

    /// A halt failure must not prevent the remaining teardown steps or the
    /// encode — and the device is still released.
    #[tokio::test(start_paused = true)]
    async fn halt_failure_does_not_block_teardown_or_encode() {
        let mut source = MockSource::with_frames(frames_of_silence(3));
        source.halt_fails = true;
        let handles = source.handles();
        let (cmd_tx, mut event_rx, _buffer) =
            spawn_controller(source, CaptureTiming::default());

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S5,
            })
            .await
            .unwrap();
        wait_for_state(&mut event_rx, CaptureState::Recording).await;
        cmd_tx.send(CaptureCommand::Stop).await.unwrap();

        match wait_for_outcome(&mut event_rx).await {
            SessionEvent::Completed(artifact) => {
                assert_eq!(artifact.frame_count(), 3 * 480);
            }
            other => panic!("expected artifact despite halt failure, got {other:?}"),
        }
        assert!(!handles.lock().unwrap()[0].load(Ordering::SeqCst));
    }

    /// Starting a session clears any stale frames; the artifact holds only
    /// what this session captured.
    #[tokio::test(start_paused = true)]
    async fn start_clears_stale_buffer_contents() {
        let source = MockSource::with_frames(frames_of_silence(2));
        let (cmd_tx, mut event_rx, buffer) =
            spawn_controller(source, CaptureTiming::default());

        buffer.lock().unwrap().push(vec![0.9_f32; 1_000]);

        cmd_tx
            .send(CaptureCommand::Start {
                target: ClipDuration::S5,
            })
            .await
            .unwrap();

        match wait_for_outcome(&mut event_rx).await {
            SessionEvent::Completed(artifact) => {
                assert_eq!(artifact.frame_count(), 2 * 480);
            }
            other => panic!("expected artifact, got {other:?}"),
        }
    }
}
