//! User input sampled in tick context.
//!
//! ## Components
//!
//! - **Quadrature**: rotary encoder decoding with acceleration
//! - **Buttons**: edge detection for the encoder push switch and the back button

pub mod buttons;
pub mod quadrature;

pub use buttons::{Button, ButtonHistory};
pub use quadrature::QuadratureDecoder;

/// Raw pin levels captured at the start of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSample {
    /// Encoder phase, `A | B << 1` (pins high when open).
    pub phase: u8,
    /// Encoder push switch pin level (high = released).
    pub encoder_high: bool,
    /// Back button pin level (high = released).
    pub back_high: bool,
}

impl InputSample {
    /// Encoder resting in its detent, nothing pressed.
    pub const IDLE: Self = Self {
        phase: crate::config::ROTARY_DETENT_PHASE,
        encoder_high: true,
        back_high: true,
    };
}
