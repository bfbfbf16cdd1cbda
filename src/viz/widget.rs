//! egui waveform widget — live and static render paths.
//!
//! Both paths run on egui's repaint loop, which keeps exactly one frame in
//! flight; scheduling the next repaint replaces any previously requested
//! one, so there is never a second concurrent drawing loop.
//!
//! * **Live path** — redraws background, decimated waveform from the latest
//!   buffer snapshot, the instantaneous signal overlaid in a distinct color,
//!   and a progress bar sized `width × elapsed/target`.
//! * **Static path** — blits the cached raster texture (see
//!   [`super::raster`]) and draws only the playback cursor.

use egui::{pos2, vec2, Color32, Rect, Sense, Shape, Stroke, TextureHandle, TextureOptions, Ui};

use super::decimate::{decimate, peak_to_y, segment_count};
use super::raster::rasterize_static;
use super::theme::Palette;

/// Window of most-recent samples drawn as the live overlay.
const LIVE_OVERLAY_SAMPLES: usize = 2_048;

/// Height of the recording progress bar in pixels.
const PROGRESS_BAR_HEIGHT: f32 = 3.0;

// ---------------------------------------------------------------------------
// WaveformView
// ---------------------------------------------------------------------------

/// Stroke geometry shared by both render paths.
#[derive(Debug, Clone, Copy)]
pub struct WaveformView {
    /// Width of one decimated stroke in pixels.
    pub line_width: f32,
    /// Vertical gain applied to peaks (biological signals are quiet).
    pub amplify: f32,
}

impl Default for WaveformView {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            amplify: 3.0,
        }
    }
}

impl WaveformView {
    /// Draw the live/recording path.
    ///
    /// `snapshot` is the full flattened buffer snapshot; `progress` is
    /// `elapsed / target` in `[0, 1]`.
    pub fn live(
        &self,
        ui: &mut Ui,
        height: f32,
        snapshot: &[f32],
        progress: f32,
        palette: &Palette,
    ) {
        let (rect, _) =
            ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
        let painter = ui.painter_at(rect);

        painter.rect_filled(rect, 2.0, palette.background);
        self.draw_grid(&painter, rect, palette);
        self.draw_peaks(&painter, rect, snapshot, palette.line);
        self.draw_live_overlay(&painter, rect, snapshot, palette.highlight);

        // Progress bar along the bottom edge.
        let bar_width = rect.width() * progress.clamp(0.0, 1.0);
        painter.rect_filled(
            Rect::from_min_size(
                pos2(rect.left(), rect.bottom() - PROGRESS_BAR_HEIGHT),
                vec2(bar_width, PROGRESS_BAR_HEIGHT),
            ),
            0.0,
            palette.progress,
        );
    }

    /// Draw the playback/static path: cached texture + cursor at
    /// `cursor_frac` of the width.
    pub fn static_view(
        &self,
        ui: &mut Ui,
        height: f32,
        texture: &TextureHandle,
        cursor_frac: f32,
        palette: &Palette,
    ) {
        let (rect, _) =
            ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
        let painter = ui.painter_at(rect);

        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );

        let x = rect.left() + rect.width() * cursor_frac.clamp(0.0, 1.0);
        painter.line_segment(
            [pos2(x, rect.top()), pos2(x, rect.bottom())],
            Stroke::new(1.0, palette.cursor),
        );
    }

    fn draw_grid(&self, painter: &egui::Painter, rect: Rect, palette: &Palette) {
        let center_y = rect.center().y;
        painter.line_segment(
            [pos2(rect.left(), center_y), pos2(rect.right(), center_y)],
            Stroke::new(1.0, palette.grid),
        );
    }

    /// One vertical stroke per decimated segment, flat-line for silence.
    fn draw_peaks(&self, painter: &egui::Painter, rect: Rect, samples: &[f32], color: Color32) {
        let total_segments = segment_count(rect.width(), self.line_width);
        let center_y = rect.center().y;
        let half_height = rect.height() / 2.0;

        for (i, seg) in decimate(samples, total_segments).iter().enumerate() {
            let x = rect.left() + (i as f32 + 0.5) * self.line_width;
            let mut y_high = peak_to_y(seg.max, center_y, half_height, self.amplify)
                .clamp(rect.top(), rect.bottom());
            let y_low = peak_to_y(seg.min, center_y, half_height, self.amplify)
                .clamp(rect.top(), rect.bottom());
            if (y_high - y_low).abs() < 1.0 {
                y_high = y_low + 1.0;
            }
            painter.line_segment(
                [pos2(x, y_low), pos2(x, y_high)],
                Stroke::new(self.line_width, color),
            );
        }
    }

    /// Polyline of the newest samples on top of the decimated strokes.
    fn draw_live_overlay(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        snapshot: &[f32],
        color: Color32,
    ) {
        if snapshot.is_empty() {
            return;
        }
        let tail_start = snapshot.len().saturating_sub(LIVE_OVERLAY_SAMPLES);
        let tail = &snapshot[tail_start..];
        if tail.len() < 2 {
            return;
        }

        let center_y = rect.center().y;
        let half_height = rect.height() / 2.0;
        let step = rect.width() / (tail.len() - 1) as f32;

        let points: Vec<egui::Pos2> = tail
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                pos2(
                    rect.left() + i as f32 * step,
                    peak_to_y(s, center_y, half_height, self.amplify)
                        .clamp(rect.top(), rect.bottom()),
                )
            })
            .collect();

        painter.add(Shape::line(points, Stroke::new(1.0, color)));
    }
}

// ---------------------------------------------------------------------------
// StaticWaveform — raster cache
// ---------------------------------------------------------------------------

/// Cache key for the static raster: any change forces a re-rasterize.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    width: usize,
    height: usize,
    dark: bool,
    revision: u64,
}

/// Owns the cached texture for the static path.
///
/// The app bumps `revision` whenever a new artifact arrives; resize and
/// theme changes are detected from the key.  Decimation therefore runs once
/// per (artifact, size, theme), not per frame.
#[derive(Default)]
pub struct StaticWaveform {
    texture: Option<TextureHandle>,
    key: Option<CacheKey>,
}

impl StaticWaveform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached texture, re-rasterizing only when the key changed.
    #[allow(clippy::too_many_arguments)]
    pub fn ensure(
        &mut self,
        ctx: &egui::Context,
        samples: &[f32],
        width: usize,
        height: usize,
        dark: bool,
        revision: u64,
        view: &WaveformView,
        palette: &Palette,
    ) -> &TextureHandle {
        let key = CacheKey {
            width,
            height,
            dark,
            revision,
        };

        if self.key != Some(key) || self.texture.is_none() {
            let image =
                rasterize_static(samples, width, height, view.line_width, view.amplify, palette);
            self.texture = Some(ctx.load_texture("waveform-static", image, TextureOptions::NEAREST));
            self.key = Some(key);
        }

        self.texture.as_ref().expect("texture was just ensured")
    }

    /// Drop the cached texture (e.g. when the artifact is discarded).
    pub fn invalidate(&mut self) {
        self.texture = None;
        self.key = None;
    }
}
