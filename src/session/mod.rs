//! Capture session — state machine, dual-timer auto-stop, device ownership.
//!
//! The controller task is the only writer of session state; the UI observes
//! it through [`SessionEvent`]s and steers it with [`CaptureCommand`]s.
//!
//! ```text
//! UI ──CaptureCommand──▶ CaptureController ──SessionEvent──▶ UI
//!                             │
//!                             ├─ owns the CaptureSource stream
//!                             ├─ ticks elapsed / normal stop (100 ms)
//!                             ├─ hard deadline at target + 500 ms
//!                             └─ hands frames to codec on stop
//! ```

pub mod controller;
pub mod state;

pub use controller::{new_shared_buffer, CaptureController, CaptureTiming, SharedFrameBuffer};
pub use state::{CaptureCommand, CaptureError, CaptureState, ClipDuration, SessionEvent};
