//! Bounded FIFO buffer of raw capture frames.
//!
//! The cpal callback delivers audio in fixed-length frames; while a capture
//! session is running those frames accumulate here.  The buffer is bounded:
//! when [`CAPACITY`] frames are stored, pushing a new frame **evicts** the
//! oldest one.  The bound is a safety net — a full 30 s capture at 48 kHz
//! fits without any eviction.
//!
//! Readers never see the internal storage.  [`snapshot`](SampleFrameBuffer::snapshot)
//! returns a flattened copy, so the renderer can never observe a frame that
//! is still being written.
//!
//! # Example
//!
//! ```rust
//! use auscult::audio::SampleFrameBuffer;
//!
//! let mut buf = SampleFrameBuffer::with_capacity(2);
//! buf.push(vec![1.0, 2.0]);
//! buf.push(vec![3.0, 4.0]);
//! buf.push(vec![5.0, 6.0]); // capacity 2 → oldest frame dropped
//! assert_eq!(buf.snapshot(), vec![3.0, 4.0, 5.0, 6.0]);
//! ```

use std::collections::VecDeque;

/// Maximum number of frames the buffer will hold before evicting.
pub const CAPACITY: usize = 1024 * 200;

// ---------------------------------------------------------------------------
// SampleFrameBuffer
// ---------------------------------------------------------------------------

/// A bounded, ordered accumulator of capture frames.
///
/// ## Overflow behaviour
///
/// When [`push`](Self::push) would exceed the frame capacity, the oldest
/// frame is dropped (FIFO eviction).  `len_frames()` therefore never exceeds
/// the capacity, regardless of append rate or total elapsed time.
pub struct SampleFrameBuffer {
    frames: VecDeque<Vec<f32>>,
    capacity: usize,
    /// Total number of samples across all stored frames (kept in sync so
    /// `len_samples()` is O(1)).
    sample_count: usize,
}

impl SampleFrameBuffer {
    /// Create a buffer with the default [`CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    /// Create a buffer bounded at `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "SampleFrameBuffer capacity must be > 0");
        Self {
            frames: VecDeque::new(),
            capacity,
            sample_count: 0,
        }
    }

    /// Append one frame, evicting the oldest frame when at capacity.
    ///
    /// O(1) amortized — no per-sample work is done here, so this is safe to
    /// call from the capture drain path.
    pub fn push(&mut self, frame: Vec<f32>) {
        if self.frames.len() == self.capacity {
            if let Some(evicted) = self.frames.pop_front() {
                self.sample_count -= evicted.len();
            }
        }
        self.sample_count += frame.len();
        self.frames.push_back(frame);
    }

    /// Return a flattened copy of every stored sample, oldest first.
    ///
    /// The copy is fully formed before it is returned; callers never hold a
    /// view into live storage.
    pub fn snapshot(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.sample_count);
        for frame in &self.frames {
            out.extend_from_slice(frame);
        }
        out
    }

    /// Flatten and remove every stored sample, leaving the buffer empty.
    pub fn take_all(&mut self) -> Vec<f32> {
        let out = self.snapshot();
        self.clear();
        out
    }

    /// Discard all frames.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.sample_count = 0;
    }

    /// Number of frames currently stored (≤ capacity).
    pub fn len_frames(&self) -> usize {
        self.frames.len()
    }

    /// Total number of samples across all stored frames.
    pub fn len_samples(&self) -> usize {
        self.sample_count
    }

    /// Returns `true` when no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of frames the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SampleFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Basic push / snapshot ---------------------------------------------

    #[test]
    fn push_and_snapshot_preserves_order() {
        let mut buf = SampleFrameBuffer::with_capacity(8);
        buf.push(vec![1.0, 2.0]);
        buf.push(vec![3.0]);
        assert_eq!(buf.len_frames(), 2);
        assert_eq!(buf.len_samples(), 3);
        assert_eq!(buf.snapshot(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn snapshot_is_a_copy_not_a_view() {
        let mut buf = SampleFrameBuffer::with_capacity(8);
        buf.push(vec![1.0]);
        let snap = buf.snapshot();
        buf.push(vec![2.0]);
        // The earlier snapshot must be unaffected by later writes.
        assert_eq!(snap, vec![1.0]);
        assert_eq!(buf.snapshot(), vec![1.0, 2.0]);
    }

    // ---- FIFO eviction ------------------------------------------------------

    #[test]
    fn eviction_drops_oldest_frame_first() {
        let mut buf = SampleFrameBuffer::with_capacity(2);
        buf.push(vec![1.0]);
        buf.push(vec![2.0, 2.5]);
        buf.push(vec![3.0]);
        assert_eq!(buf.len_frames(), 2);
        assert_eq!(buf.snapshot(), vec![2.0, 2.5, 3.0]);
    }

    #[test]
    fn frame_count_never_exceeds_capacity() {
        let mut buf = SampleFrameBuffer::with_capacity(16);
        for i in 0..10_000 {
            buf.push(vec![i as f32; 4]);
            assert!(buf.len_frames() <= buf.capacity());
        }
        assert_eq!(buf.len_frames(), 16);
        assert_eq!(buf.len_samples(), 16 * 4);
    }

    #[test]
    fn sample_count_tracks_variable_frame_lengths_under_eviction() {
        let mut buf = SampleFrameBuffer::with_capacity(3);
        buf.push(vec![0.0; 5]);
        buf.push(vec![0.0; 7]);
        buf.push(vec![0.0; 11]);
        buf.push(vec![0.0; 2]); // evicts the 5-sample frame
        assert_eq!(buf.len_samples(), 7 + 11 + 2);
        assert_eq!(buf.snapshot().len(), buf.len_samples());
    }

    // ---- take_all / clear ---------------------------------------------------

    #[test]
    fn take_all_drains_and_empties() {
        let mut buf = SampleFrameBuffer::with_capacity(4);
        buf.push(vec![1.0, 2.0]);
        let samples = buf.take_all();
        assert_eq!(samples, vec![1.0, 2.0]);
        assert!(buf.is_empty());
        assert_eq!(buf.len_samples(), 0);
    }

    #[test]
    fn take_all_on_empty_returns_empty_vec() {
        let mut buf = SampleFrameBuffer::with_capacity(4);
        assert_eq!(buf.take_all(), Vec::<f32>::new());
    }

    #[test]
    fn clear_resets_and_buffer_is_reusable() {
        let mut buf = SampleFrameBuffer::with_capacity(4);
        buf.push(vec![1.0]);
        buf.clear();
        assert!(buf.is_empty());

        buf.push(vec![9.0]);
        assert_eq!(buf.snapshot(), vec![9.0]);
    }

    // ---- Default capacity ---------------------------------------------------

    #[test]
    fn default_capacity_matches_const() {
        let buf = SampleFrameBuffer::new();
        assert_eq!(buf.capacity(), CAPACITY);
    }

    // ---- Panic guard --------------------------------------------------------

    #[test]
    #[should_panic(expected = "SampleFrameBuffer capacity must be > 0")]
    fn zero_capacity_panics() {
        let _ = SampleFrameBuffer::with_capacity(0);
    }
}
