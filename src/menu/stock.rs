//! Stock adjust helpers for `MenuEntry::Number` callbacks.
//!
//! Each helper applies a rotary delta to a setting in place and returns
//! the new value. A delta of 0 only reads, so drawing a row never rewrites
//! a loaded setting.

use crate::color::{WHITE_TEMP_MAX, WHITE_TEMP_MIN};
use crate::config::LCD_TIMEOUT_MAX_SECS;

/// Kelvin per rotary step for color temperature.
pub const COLOR_TEMP_STEP: i32 = 100;

fn adjust_clamped(value: &mut u16, delta: i32, min: u16, max: u16) -> i32 {
    if delta == 0 {
        return *value as i32;
    }
    let next = (*value as i32 + delta).clamp(min as i32, max as i32);
    *value = next as u16;
    next
}

/// Percent, clamped to `[0, 100]`.
pub fn adjust_percent(value: &mut u16, delta: i8) -> i32 {
    adjust_clamped(value, delta as i32, 0, 100)
}

/// Angle in degrees, wrapping modulo 360.
pub fn adjust_circle(value: &mut u16, delta: i8) -> i32 {
    if delta == 0 {
        return *value as i32;
    }
    let next = (*value as i32 + delta as i32).rem_euclid(360);
    *value = next as u16;
    next
}

/// Color temperature, [`COLOR_TEMP_STEP`] per step, clamped to the range
/// the black-body approximation supports.
pub fn adjust_color_temp(value: &mut u16, delta: i8) -> i32 {
    adjust_clamped(value, delta as i32 * COLOR_TEMP_STEP, WHITE_TEMP_MIN, WHITE_TEMP_MAX)
}

/// Seconds, clamped to `[0, LCD_TIMEOUT_MAX_SECS]`.
pub fn adjust_seconds(value: &mut u16, delta: i8) -> i32 {
    adjust_clamped(value, delta as i32, 0, LCD_TIMEOUT_MAX_SECS)
}
