//! Unified error type for blinkenlights.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Derives `defmt::Format` when the `defmt` feature is on.

/// Top-level error type used across the firmware.
///
/// None of these ever leave the main loop: the caller logs them and the
/// requested action simply does nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Storage
    /// Flash read/write/erase failed.
    Storage,

    /// A stored settings record is too short, has a foreign version tag
    /// or an unknown color mode.
    SettingsCorrupt,

    // Display
    /// Driving one of the LCD control or data lines failed.
    Display,
}
