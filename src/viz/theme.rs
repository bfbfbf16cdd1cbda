//! Waveform color palettes.
//!
//! The palette is a pure function of the light/dark flag.  Re-rendering on a
//! theme change swaps colors only — decimation results are untouched.

use egui::Color32;

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Colors used by both waveform render paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Canvas fill behind the waveform.
    pub background: Color32,
    /// Decimated waveform strokes.
    pub line: Color32,
    /// Center reference line.
    pub grid: Color32,
    /// Live-signal overlay drawn on top of the decimated waveform.
    pub highlight: Color32,
    /// Recording progress bar.
    pub progress: Color32,
    /// Playback cursor.
    pub cursor: Color32,
}

/// Resolve the palette for the given theme flag.
pub fn palette(dark: bool) -> Palette {
    if dark {
        Palette {
            background: Color32::from_rgb(24, 26, 30),
            line: Color32::from_rgb(96, 170, 255),
            grid: Color32::from_rgb(52, 56, 64),
            highlight: Color32::from_rgb(80, 200, 120),
            progress: Color32::from_rgb(255, 140, 80),
            cursor: Color32::from_rgb(255, 96, 96),
        }
    } else {
        Palette {
            background: Color32::from_rgb(246, 247, 249),
            line: Color32::from_rgb(36, 98, 180),
            grid: Color32::from_rgb(210, 214, 220),
            highlight: Color32::from_rgb(30, 140, 80),
            progress: Color32::from_rgb(220, 110, 40),
            cursor: Color32::from_rgb(200, 40, 40),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_pure_in_the_flag() {
        assert_eq!(palette(true), palette(true));
        assert_eq!(palette(false), palette(false));
        assert_ne!(palette(true), palette(false));
    }

    #[test]
    fn line_contrasts_with_background() {
        for dark in [true, false] {
            let p = palette(dark);
            assert_ne!(p.line, p.background);
            assert_ne!(p.highlight, p.background);
        }
    }
}
