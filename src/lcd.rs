//! Character LCD (HD44780-compatible, 20 × 4) in 4-bit write-only mode.
//!
//! DDRAM address map of a 20 × 4 module:
//!
//! ```text
//!  row 0: 0x00 .. 0x13
//!  row 1: 0x40 .. 0x53
//!  row 2: 0x14 .. 0x27   (continues row 0)
//!  row 3: 0x54 .. 0x67   (continues row 1)
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{LCD_COLUMNS, LCD_ROWS};
use crate::error::Error;

/// Marks the selected menu row.
pub const SELECT_MARKER: char = '→';
/// Marks the selected row while its value is being edited.
pub const EDIT_MARKER: char = '*';
/// Shown in front of "go back" entries.
pub const BACK_ARROW: char = '←';
/// Shown at the right edge of entries that open a submenu.
pub const SUBMENU_MARKER: char = '>';

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

// Instruction set
const CMD_CLEAR_DISPLAY: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

const ENTRY_INCREMENT: u8 = 0x02;
const DISPLAY_ON: u8 = 0x04;
const FUNCTION_8BIT: u8 = 0x10;
const FUNCTION_TWO_LINES: u8 = 0x08;

/// Anything that can show text on a character grid.
pub trait TextSink {
    fn clear(&mut self);

    /// Write `text` starting at `col`/`row`. Characters past the right
    /// edge are dropped.
    fn write_at(&mut self, col: u8, row: u8, text: &str);

    fn write_char(&mut self, col: u8, row: u8, ch: char) {
        let mut buf = [0u8; 4];
        self.write_at(col, row, ch.encode_utf8(&mut buf));
    }
}

/// DDRAM address of a cell.
pub const fn ddram_address(col: u8, row: u8) -> u8 {
    ROW_OFFSETS[(row % LCD_ROWS) as usize] + col
}

/// Character ROM code (A00 table) for `ch`. Unmapped characters show as
/// a blank block.
pub fn rom_code(ch: char) -> u8 {
    match ch {
        ' '..='}' => ch as u8,
        '→' => 0x7E,
        '←' => 0x7F,
        '°' => 0xDF,
        'ä' => 0xE1,
        'ö' => 0xEF,
        'ü' => 0xF5,
        _ => 0xFF,
    }
}

/// HD44780 over six GPIOs (RS, E, D4..D7). R/W is tied to ground.
pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    data: [P; 4],
    delay: D,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Self {
        Self { rs, en, data, delay }
    }

    /// Power-on initialisation by instruction: three times "8 bit", then
    /// switch to 4 bit, two lines, display on, cleared, cursor moving right.
    pub fn init(&mut self) -> Result<(), Error> {
        self.delay.delay_ms(15);
        self.rs.set_low().map_err(|_| Error::Display)?;

        let wake = (CMD_FUNCTION_SET | FUNCTION_8BIT) >> 4;
        self.write_nibble(wake)?;
        self.delay.delay_ms(5);
        self.write_nibble(wake)?;
        self.delay.delay_ms(1);
        self.write_nibble(wake)?;
        self.delay.delay_ms(1);
        self.write_nibble(CMD_FUNCTION_SET >> 4)?;
        self.delay.delay_ms(1);

        self.command(CMD_FUNCTION_SET | FUNCTION_TWO_LINES)?;
        self.command(CMD_DISPLAY_CONTROL | DISPLAY_ON)?;
        self.try_clear()?;
        self.command(CMD_ENTRY_MODE | ENTRY_INCREMENT)?;

        info!("LCD: initialised {}x{}", LCD_COLUMNS, LCD_ROWS);
        Ok(())
    }

    pub fn try_clear(&mut self) -> Result<(), Error> {
        self.command(CMD_CLEAR_DISPLAY)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error> {
        self.command(CMD_SET_DDRAM_ADDR | ddram_address(col, row))
    }

    pub fn try_write_at(&mut self, col: u8, row: u8, text: &str) -> Result<(), Error> {
        if col >= LCD_COLUMNS {
            return Ok(());
        }
        self.set_cursor(col, row)?;
        for ch in text.chars().take((LCD_COLUMNS - col) as usize) {
            self.write_byte(true, rom_code(ch))?;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), Error> {
        self.write_byte(false, cmd)
    }

    fn write_byte(&mut self, data: bool, byte: u8) -> Result<(), Error> {
        let res = if data {
            self.rs.set_high()
        } else {
            self.rs.set_low()
        };
        res.map_err(|_| Error::Display)?;
        self.write_nibble(byte >> 4)?;
        self.write_nibble(byte & 0x0F)?;
        // Longest regular instruction takes 37 µs.
        self.delay.delay_us(50);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), Error> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            let res = if nibble & (1 << bit) != 0 {
                pin.set_high()
            } else {
                pin.set_low()
            };
            res.map_err(|_| Error::Display)?;
        }
        self.en.set_high().map_err(|_| Error::Display)?;
        self.delay.delay_us(1);
        self.en.set_low().map_err(|_| Error::Display)?;
        self.delay.delay_us(1);
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> TextSink for Hd44780<P, D> {
    fn clear(&mut self) {
        if let Err(e) = self.try_clear() {
            warn!("LCD: clear failed: {:?}", e);
        }
    }

    fn write_at(&mut self, col: u8, row: u8, text: &str) {
        if let Err(e) = self.try_write_at(col, row, text) {
            warn!("LCD: write failed: {:?}", e);
        }
    }
}
