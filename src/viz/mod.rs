//! Waveform visualization — decimation → theming → raster cache → widget.
//!
//! # Render paths
//!
//! ```text
//! live:   buffer snapshot → decimate → strokes + live overlay + progress bar
//! static: artifact samples → decimate once → raster image (cached texture)
//!         → blit + playback cursor per frame
//! ```
//!
//! Decimation ([`decimate`]) and rasterization ([`rasterize_static`]) are
//! pure functions; only [`widget`] touches egui painting.

pub mod decimate;
pub mod raster;
pub mod theme;
pub mod widget;

pub use decimate::{decimate, peak_to_y, segment_count, PeakSegment};
pub use raster::rasterize_static;
pub use theme::{palette, Palette};
pub use widget::{StaticWaveform, WaveformView};
