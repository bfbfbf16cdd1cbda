//! Min/max peak decimation.
//!
//! A capture holds far more samples than the canvas has columns; decimation
//! reduces the sequence to one `(min, max)` peak pair per display segment.
//! The segment ranges partition the full sample domain — no sample is
//! counted twice and none is skipped — and the segment count depends only on
//! the canvas geometry, never on the input length.
//!
//! # Example
//!
//! ```rust
//! use auscult::viz::{decimate, segment_count};
//!
//! let samples = vec![0.0, 1.0, -1.0, 0.5, 0.25, -0.25];
//! let segments = decimate(&samples, segment_count(6.0, 2.0));
//! assert_eq!(segments.len(), 3);
//! assert_eq!(segments[0].max, 1.0);
//! assert_eq!(segments[1].min, -1.0);
//! ```

// ---------------------------------------------------------------------------
// PeakSegment
// ---------------------------------------------------------------------------

/// One display segment: the half-open sample range it covers and the peak
/// extremes found inside it.
///
/// An empty range (possible when the input is shorter than the segment
/// count) carries `min == max == 0.0` — silence draws a flat line, it is
/// never skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSegment {
    pub start: usize,
    pub end: usize,
    pub min: f32,
    pub max: f32,
}

// ---------------------------------------------------------------------------
// Decimation
// ---------------------------------------------------------------------------

/// Number of segments a canvas of `canvas_width` fits at `line_width` pixels
/// per stroke (no inter-segment spacing).
pub fn segment_count(canvas_width: f32, line_width: f32) -> usize {
    if line_width <= 0.0 || canvas_width <= 0.0 {
        return 0;
    }
    (canvas_width / line_width).floor() as usize
}

/// Decimate `samples` into exactly `total_segments` peak segments.
///
/// `samples_per_segment = max(1, floor(len / total_segments))`; every
/// segment except the last covers that many samples, the last absorbs the
/// remainder.  The returned ranges are contiguous and cover `[0, len)`.
pub fn decimate(samples: &[f32], total_segments: usize) -> Vec<PeakSegment> {
    if total_segments == 0 {
        return Vec::new();
    }

    let len = samples.len();
    let per_segment = (len / total_segments).max(1);

    let mut out = Vec::with_capacity(total_segments);
    for i in 0..total_segments {
        let start = (i * per_segment).min(len);
        let end = if i + 1 == total_segments {
            len
        } else {
            ((i + 1) * per_segment).min(len)
        };

        let (min, max) = if start < end {
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &s in &samples[start..end] {
                min = min.min(s);
                max = max.max(s);
            }
            (min, max)
        } else {
            (0.0, 0.0)
        };

        out.push(PeakSegment {
            start,
            end,
            min,
            max,
        });
    }
    out
}

/// Map a peak value to a vertical canvas coordinate.
///
/// `y = center_y + peak × half_height × amplify`.  The amplify factor
/// compensates for the low amplitude typical of biological signals.
pub fn peak_to_y(peak: f32, center_y: f32, half_height: f32, amplify: f32) -> f32 {
    center_y + peak * half_height * amplify
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
