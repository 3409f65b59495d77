//! Persisted user settings and their flash record layout.
//!
//! Record layout (26 bytes, little-endian):
//! ```text
//! Byte 0      : layout version
//! Byte 1      : color mode
//! Byte 2-3    : white intensity (%)
//! Byte 4-5    : white color temperature (K)
//! Byte 6-11   : red, green, blue (%)
//! Byte 12-17  : hue (°), saturation (%), value (%)
//! Byte 18-23  : rainbow speed, saturation, value (%)
//! Byte 24-25  : LCD idle timeout (s)
//! ```
//!
//! Only the version and mode are checked on decode. A record torn by a
//! power loss during save is otherwise used as-is.

use crate::color::Hsv;
use crate::config::{LCD_TIMEOUT_DEFAULT_SECS, SETTINGS_VERSION};
use crate::error::Error;

/// Serialized size of [`Settings`].
pub const SETTINGS_RECORD_SIZE: usize = 26;

/// What drives the LED strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorMode {
    Off,
    White,
    Rgb,
    Hsv,
    Rainbow,
}

impl ColorMode {
    pub const fn tag(self) -> u8 {
        match self {
            ColorMode::Off => 0x00,
            ColorMode::White => 0x01,
            ColorMode::Rgb => 0x02,
            ColorMode::Hsv => 0x03,
            ColorMode::Rainbow => 0x04,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(ColorMode::Off),
            0x01 => Some(ColorMode::White),
            0x02 => Some(ColorMode::Rgb),
            0x03 => Some(ColorMode::Hsv),
            0x04 => Some(ColorMode::Rainbow),
            _ => None,
        }
    }
}

/// Working copy of everything the user can configure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub version: u8,
    pub mode: ColorMode,
    /// White brightness (%).
    pub intensity: u16,
    /// White color temperature (K).
    pub color_temp: u16,
    /// Red, green, blue (%).
    pub rgb: [u16; 3],
    pub hsv: Hsv,
    /// Rainbow hue speed (%).
    pub rainbow_speed: u16,
    pub rainbow_saturation: u16,
    pub rainbow_value: u16,
    /// Idle time before the backlight fades out (s, 0 = never).
    pub lcd_timeout_s: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            mode: ColorMode::Off,
            intensity: 50,
            color_temp: 6000,
            rgb: [0, 0, 50],
            hsv: Hsv::new(0, 100, 50),
            rainbow_speed: 20,
            rainbow_saturation: 100,
            rainbow_value: 50,
            lcd_timeout_s: LCD_TIMEOUT_DEFAULT_SECS,
        }
    }
}

impl Settings {
    fn words(&self) -> [u16; 12] {
        [
            self.intensity,
            self.color_temp,
            self.rgb[0],
            self.rgb[1],
            self.rgb[2],
            self.hsv.h,
            self.hsv.s,
            self.hsv.v,
            self.rainbow_speed,
            self.rainbow_saturation,
            self.rainbow_value,
            self.lcd_timeout_s,
        ]
    }

    /// Serialise into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is too small.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        if buf.len() < SETTINGS_RECORD_SIZE {
            return 0;
        }
        buf[0] = self.version;
        buf[1] = self.mode.tag();
        for (chunk, word) in buf[2..SETTINGS_RECORD_SIZE]
            .chunks_exact_mut(2)
            .zip(self.words())
        {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        SETTINGS_RECORD_SIZE
    }

    /// Parse a stored record.
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        if data.len() < SETTINGS_RECORD_SIZE || data[0] != SETTINGS_VERSION {
            return Err(Error::SettingsCorrupt);
        }
        let mode = ColorMode::from_tag(data[1]).ok_or(Error::SettingsCorrupt)?;

        let mut w = [0u16; 12];
        for (word, chunk) in w.iter_mut().zip(data[2..SETTINGS_RECORD_SIZE].chunks_exact(2)) {
            *word = u16::from_le_bytes([chunk[0], chunk[1]]);
        }

        Ok(Self {
            version: data[0],
            mode,
            intensity: w[0],
            color_temp: w[1],
            rgb: [w[2], w[3], w[4]],
            hsv: Hsv::new(w[5], w[6], w[7]),
            rainbow_speed: w[8],
            rainbow_saturation: w[9],
            rainbow_value: w[10],
            lcd_timeout_s: w[11],
        })
    }

    /// Decode `data`, falling back to factory defaults for anything that
    /// does not look like one of our records (erased flash, old layout).
    pub fn decode_or_default(data: Option<&[u8]>) -> Self {
        match data.map(Self::decode) {
            Some(Ok(settings)) => settings,
            Some(Err(e)) => {
                warn!("Settings: stored record rejected ({:?}), using defaults", e);
                Self::default()
            }
            None => Self::default(),
        }
    }
}
