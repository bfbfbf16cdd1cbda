//! Static waveform rasterization.
//!
//! After a capture completes the samples are immutable, so the decimated
//! waveform is rasterized once into a pixel image and cached as a texture;
//! every playback repaint then blits the cached image and draws only the
//! cursor on top.  Recomputing the decimation per frame would be wasted
//! work.

use egui::{Color32, ColorImage};

use super::decimate::{decimate, peak_to_y, segment_count};
use super::theme::Palette;

// ---------------------------------------------------------------------------
// Rasterizer
// ---------------------------------------------------------------------------

/// Render `samples` into a `width × height` pixel image: background fill,
/// center grid line, one vertical stroke of `line_width` columns per
/// decimated segment.
///
/// Pure — the same inputs always produce the same image, and two palettes
/// produce images that differ in color only.
pub fn rasterize_static(
    samples: &[f32],
    width: usize,
    height: usize,
    line_width: f32,
    amplify: f32,
    palette: &Palette,
) -> ColorImage {
    let mut image = ColorImage::new([width, height], palette.background);
    if width == 0 || height == 0 {
        return image;
    }

    let center_y = height as f32 / 2.0;
    let half_height = height as f32 / 2.0;

    // Center reference line.
    let grid_row = (center_y as usize).min(height - 1);
    fill_row(&mut image, width, grid_row, palette.grid);

    let total_segments = segment_count(width as f32, line_width);
    let segments = decimate(samples, total_segments);

    for (i, seg) in segments.iter().enumerate() {
        let y_high = peak_to_y(seg.max, center_y, half_height, amplify);
        let y_low = peak_to_y(seg.min, center_y, half_height, amplify);

        let (top, bottom) = clamp_stroke(y_low, y_high, height);

        let x_start = (i as f32 * line_width) as usize;
        let x_end = (((i + 1) as f32 * line_width) as usize).min(width);
        for x in x_start..x_end {
            for y in top..=bottom {
                image.pixels[y * width + x] = palette.line;
            }
        }
    }

    image
}

/// Clamp a stroke's vertical extent to the canvas, keeping it at least one
/// pixel tall so silence stays visible.
fn clamp_stroke(y_a: f32, y_b: f32, height: usize) -> (usize, usize) {
    let max_y = (height - 1) as f32;
    let top = y_a.min(y_b).clamp(0.0, max_y) as usize;
    let bottom = y_a.max(y_b).clamp(0.0, max_y) as usize;
    (top, bottom.max(top))
}

fn fill_row(image: &mut ColorImage, width: usize, row: usize, color: Color32) {
    for x in 0..width {
        image.pixels[row * width + x] = color;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::theme::palette;

    const W: usize = 64;
    const H: usize = 32;

    fn image_for(samples: &[f32], dark: bool) -> ColorImage {
        rasterize_static(samples, W, H, 2.0, 3.0, &palette(dark))
    }

    #[test]
    fn image_has_requested_dimensions() {
        let img = image_for(&[0.0; 100], true);
        assert_eq!(img.size, [W, H]);
        assert_eq!(img.pixels.len(), W * H);
    }

    #[test]
    fn silence_draws_a_flat_center_line() {
        let p = palette(true);
        let img = image_for(&vec![0.0_f32; 1_000], true);

        let center_row = H / 2;
        // Every stroke column on the center row carries line color.
        for x in 0..W {
            assert_eq!(
                img.pixels[center_row * W + x],
                p.line,
                "column {x} skipped"
            );
        }
        // Rows away from center stay background.
        assert_eq!(img.pixels[2 * W + 5], p.background);
    }

    #[test]
    fn loud_signal_reaches_beyond_quiet_signal() {
        let p = palette(true);
        let quiet = image_for(&vec![0.05_f32; 1_000], true);
        let loud = image_for(
            &(0..1_000)
                .map(|i| if i % 2 == 0 { 0.3 } else { -0.3 })
                .collect::<Vec<f32>>(),
            true,
        );

        let count = |img: &ColorImage| img.pixels.iter().filter(|&&c| c == p.line).count();
        assert!(count(&loud) > count(&quiet));
    }

    #[test]
    fn theme_change_recolors_without_moving_pixels() {
        let samples: Vec<f32> = (0..2_000).map(|i| ((i as f32) * 0.01).sin() * 0.2).collect();
        let dark_img = image_for(&samples, true);
        let light_img = image_for(&samples, false);
        let (dark_p, light_p) = (palette(true), palette(false));

        for (d, l) in dark_img.pixels.iter().zip(&light_img.pixels) {
            let d_is_line = *d == dark_p.line;
            let l_is_line = *l == light_p.line;
            assert_eq!(d_is_line, l_is_line, "stroke geometry changed with theme");
        }
    }

    #[test]
    fn out_of_range_peaks_are_clamped_to_canvas() {
        // amplify 3 pushes ±1.0 far outside the canvas; must not panic.
        let img = image_for(&vec![1.0_f32, -1.0, 1.0, -1.0], true);
        assert_eq!(img.pixels.len(), W * H);
    }

    #[test]
    fn zero_sized_canvas_is_harmless() {
        let img = rasterize_static(&[0.1; 10], 0, 0, 2.0, 3.0, &palette(true));
        assert!(img.pixels.is_empty());
    }
}
