//! Color conversions. Pure functions, integer math except for the
//! black-body approximation.
//!
//! Conventions:
//! - RGB channels are full-scale `u16` (0 = off, 0xFFFF = full).
//! - Hue is in degrees `[0, 360)`, saturation and value in percent `[0, 100]`.

use libm::{logf, powf};

/// RGB triple, full-scale per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Build from percentages (each clamped to 100).
    pub fn from_percent(r: u16, g: u16, b: u16) -> Self {
        Self::new(percent_to_full(r), percent_to_full(g), percent_to_full(b))
    }

    /// Scale every channel by `percent` (clamped to 100).
    pub fn scaled(self, percent: u16) -> Self {
        let scale = |c: u16| (c as u32 * percent.min(100) as u32 / 100) as u16;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    pub fn channels(self) -> [u16; 3] {
        [self.r, self.g, self.b]
    }
}

/// Hue/saturation/value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hsv {
    /// Degrees, `[0, 360)`.
    pub h: u16,
    /// Percent.
    pub s: u16,
    /// Percent.
    pub v: u16,
}

impl Hsv {
    pub const fn new(h: u16, s: u16, v: u16) -> Self {
        Self { h, s, v }
    }
}

/// Map 0..=100 % to 0..=0xFFFF, rounding to nearest.
pub fn percent_to_full(percent: u16) -> u16 {
    ((percent.min(100) as u32 * 0xFFFF + 50) / 100) as u16
}

/// Map 0..=0xFFFF to 0..=100 %, rounding to nearest.
pub fn full_to_percent(value: u16) -> u16 {
    ((value as u32 * 100 + 0x7FFF) / 0xFFFF) as u16
}

/// Perceptual brightness to PWM duty. Quadratic, 0 → 0 and 0xFFFF → 0xFFFF,
/// monotone in between.
pub fn brightness_to_pwm(brightness: u16) -> u16 {
    let b = brightness as u32;
    ((b * b + 0x7FFF) / 0xFFFF) as u16
}

/// HSV to RGB, sector-wise.
pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let v = percent_to_full(hsv.v) as u64;
    let s = hsv.s.min(100) as u64;
    if s == 0 {
        return Rgb::new(v as u16, v as u16, v as u16);
    }

    let h = (hsv.h % 360) as u64;
    let sector = h / 60;
    // Position inside the sector, 0..60 scaled to 0..6000.
    let f = (h % 60) * 100;

    let p = v * (100 - s) / 100;
    let q = v * (600_000 - s * f) / 600_000;
    let t = v * (600_000 - s * (6000 - f)) / 600_000;

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::new(r as u16, g as u16, b as u16)
}

/// RGB to HSV. Black and greys report hue 0.
pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let [r, g, b] = rgb.channels().map(|c| c as i32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = full_to_percent(max as u16);
    if max == 0 {
        return Hsv::new(0, 0, v);
    }
    let s = ((delta * 100 + max / 2) / max) as u16;
    if delta == 0 {
        return Hsv::new(0, s, v);
    }

    let h = if max == r {
        60 * (g - b) / delta
    } else if max == g {
        120 + 60 * (b - r) / delta
    } else {
        240 + 60 * (r - g) / delta
    };
    Hsv::new(h.rem_euclid(360) as u16, s, v)
}

/// Lowest and highest supported color temperature (Kelvin).
pub const WHITE_TEMP_MIN: u16 = 1000;
pub const WHITE_TEMP_MAX: u16 = 40000;

/// Approximate the color of a black body at `kelvin` (clamped to
/// 1000 K..=40000 K).
pub fn white_to_rgb(kelvin: u16) -> Rgb {
    let t = kelvin.clamp(WHITE_TEMP_MIN, WHITE_TEMP_MAX) as f32 / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * powf(t - 60.0, -0.133_204_76)
    };
    let g = if t <= 66.0 {
        99.470_8 * logf(t) - 161.119_57
    } else {
        288.122_16 * powf(t - 60.0, -0.075_514_846)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * logf(t - 10.0) - 305.044_8
    };

    let full = |c: f32| (c.clamp(0.0, 255.0) * 257.0) as u16;
    Rgb::new(full(r), full(g), full(b))
}
