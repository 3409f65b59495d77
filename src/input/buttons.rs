//! Push button edge detection by tick-rate sampling.
//!
//! Two buttons (the encoder's push switch and the separate back button),
//! both active-low with pull-ups. Each tick the "new" bits move into the
//! "old" bits and the pins are sampled into the "new" bits:
//!
//! ```text
//! Bit 0: encoder push, current    Bit 1: encoder push, previous
//! Bit 2: back button, current     Bit 3: back button, previous
//! ```
//!
//! There is no debounce filter beyond the tick rate; a bouncing contact
//! can produce more than one edge.

/// One of the two push buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Push switch of the rotary encoder.
    Encoder,
    /// Separate back button.
    Back,
}

impl Button {
    const fn new_bit(self) -> u8 {
        match self {
            Button::Encoder => ButtonHistory::ENCODER_NEW,
            Button::Back => ButtonHistory::BACK_NEW,
        }
    }

    const fn old_bit(self) -> u8 {
        self.new_bit() << 1
    }

    const fn mask(self) -> u8 {
        self.new_bit() | self.old_bit()
    }
}

/// Current and previous sample of both buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonHistory(u8);

impl ButtonHistory {
    pub const ENCODER_NEW: u8 = 0x01;
    pub const ENCODER_OLD: u8 = 0x02;
    pub const BACK_NEW: u8 = 0x04;
    pub const BACK_OLD: u8 = 0x08;

    const NEW_BITS: u8 = Self::ENCODER_NEW | Self::BACK_NEW;
    const OLD_BITS: u8 = Self::ENCODER_OLD | Self::BACK_OLD;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::NEW_BITS | Self::OLD_BITS))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Shift current into previous and take a new sample from the raw pin
    /// levels (`true` = high = released).
    pub fn shift_in(self, encoder_level_high: bool, back_level_high: bool) -> Self {
        let mut bits = (self.0 << 1) & Self::OLD_BITS;
        if !encoder_level_high {
            bits |= Self::ENCODER_NEW;
        }
        if !back_level_high {
            bits |= Self::BACK_NEW;
        }
        Self(bits)
    }

    pub fn is_pressed(self, button: Button) -> bool {
        self.0 & button.new_bit() != 0
    }

    /// Pressed now, released on the previous tick.
    pub fn rose(self, button: Button) -> bool {
        self.0 & button.mask() == button.new_bit()
    }

    /// Released now, pressed on the previous tick.
    pub fn fell(self, button: Button) -> bool {
        self.0 & button.mask() == button.old_bit()
    }

    /// Bit set of buttons with a rising edge on this tick, using the
    /// `*_NEW` positions.
    pub fn rising_edges(self) -> u8 {
        self.0 & !(self.0 >> 1) & Self::NEW_BITS
    }

    /// Any edge on either button.
    pub fn any_edge(self) -> bool {
        ((self.0 << 1) ^ self.0) & Self::OLD_BITS != 0
    }
}
