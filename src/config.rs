//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, thresholds, geometry and storage constants live
//! here so they can be tuned in one place.

// Tick

/// Tick period (µs). TIMER1 runs at 1 MHz and clears on compare 0.
/// 4096 µs matches a 16 MHz clock overflowing a 16 bit counter.
pub const TICK_PERIOD_US: u32 = 4096;

/// Whole ticks per second (244.14 Hz, rounded down).
pub const TICKS_PER_SECOND: u16 = (1_000_000 / TICK_PERIOD_US) as u16;

// Rotary encoder

/// Quadrature phase of the mechanical rest position (both contacts open).
pub const ROTARY_DETENT_PHASE: u8 = 0b11;

/// Phase entered from the detent on a clockwise step.
pub const ROTARY_CW_PHASE: u8 = 0b10;

/// Phase entered from the detent on a counter-clockwise step.
pub const ROTARY_CCW_PHASE: u8 = 0b01;

/// Acceleration table: `(ticks since last step greater than, magnitude)`.
/// Checked top to bottom; anything not matched gets [`ROTARY_MAX_MAGNITUDE`].
pub const ROTARY_SPEED_TABLE: [(u8, i8); 3] = [(50, 1), (20, 2), (10, 3)];

/// Magnitude for the fastest turning.
pub const ROTARY_MAX_MAGNITUDE: i8 = 4;

// LCD backlight

/// Fade-in increment per main-loop pass (full range in ~0.2 s).
pub const FADE_IN_STEP: u16 = (65536 / 244) as u16 * 5;

/// Fade-out decrement per main-loop pass (full range in ~1 s).
pub const FADE_OUT_STEP: u16 = (65536 / 244) as u16;

/// Factory default idle time before the backlight fades out (seconds).
pub const LCD_TIMEOUT_DEFAULT_SECS: u16 = 10;

/// Upper bound for the configurable idle time (seconds).
/// 240 s × 244 ticks still fits the 16 bit timeout counter.
pub const LCD_TIMEOUT_MAX_SECS: u16 = 240;

// LCD geometry (TC2004A, 20 × 4)

pub const LCD_COLUMNS: u8 = 20;
pub const LCD_ROWS: u8 = 4;

// Menu

/// Maximum nesting of submenus, root included.
pub const MENU_MAX_DEPTH: usize = 3;

/// Number of menu rows visible at once.
pub const MENU_VISIBLE_ROWS: usize = LCD_ROWS as usize;

/// Column where the numeric value of a `Number` entry starts.
pub const MENU_VALUE_COLUMN: u8 = 14;

// PWM

/// Full-scale duty (always on).
pub const PWM_MAX_DUTY: u16 = u16::MAX;

/// Counter top of the PWM peripheral (15 bit, 16 MHz / 32767 ≈ 488 Hz).
pub const PWM_COUNTER_TOP: u16 = 0x7FFF;

// GPIO pin assignments (nRF52840-DK)
//
//   Encoder A        → P0.03
//   Encoder B        → P0.04
//   Encoder push     → P0.28
//   Back button      → P0.29
//   LCD RS           → P0.30
//   LCD E            → P0.31
//   LCD D4..D7       → P1.10..P1.13
//   LCD backlight    → P0.13 (PWM0 ch0)
//   Strip R / G / B  → P0.14 / P0.15 / P0.16 (PWM0 ch1..3)

// Rainbow

/// Hue advance per pass per percent of rainbow speed, in 1/256 degree.
/// 100 % turns the wheel about once per second.
pub const RAINBOW_HUE_STEP_PER_PERCENT: u32 = 4;

// Settings storage

/// Layout version of the persisted settings record.
pub const SETTINGS_VERSION: u8 = 1;

/// Flash page index where settings storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 254;

/// Number of flash pages reserved for settings storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 2;
