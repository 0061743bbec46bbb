//! Red-to-green color ramp used to paint member progress bars.

use std::fmt;

/// Hue at zero progress (red), in degrees.
pub const START_HUE: f64 = 0.0;
/// Hue at full progress (green), in degrees.
pub const END_HUE: f64 = 120.0;

const LIGHTNESS: f64 = 0.5;
const SATURATION: f64 = 1.0;

/// An sRGB color with 8-bit channels. Displays as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Hue in degrees for a progress ratio. Ratios outside `[0, 1]` are clamped
/// and `NaN` is treated as zero progress.
#[must_use]
pub fn hue_for_progress(progress: f64) -> f64 {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    START_HUE + (END_HUE - START_HUE) * progress
}

/// Display color for a progress ratio: hue interpolated from red to green at
/// full saturation and half lightness.
#[must_use]
pub fn progress_color(progress: f64) -> Rgb {
    let (r, g, b) = hls_to_rgb(hue_for_progress(progress) / 360.0, LIGHTNESS, SATURATION);
    Rgb {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

// Truncates, so a channel only reaches 255 at exactly 1.0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// HLS to RGB, all components in `[0, 1]`.
fn hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    (
        hue_component(m1, m2, h + 1.0 / 3.0),
        hue_component(m1, m2, h),
        hue_component(m1, m2, h - 1.0 / 3.0),
    )
}

fn hue_component(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}
