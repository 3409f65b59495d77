//! Rotary encoder quadrature decoder with virtual acceleration.
//!
//! The encoder is sampled once per tick as a 2 bit phase
//! (`terminal A | terminal B << 1`, both with pull-ups):
//!
//! ```text
//! A-C  Off ----+     +-----+     +----
//!              |     |     |     |
//!      On      +-----+     +-----+
//!
//! B-C  Off  +-----+     +-----+     +-
//!           |     |     |     |     |
//!      On  -+     +-----+     +-----+
//!
//!           ^           ^           ^
//!           +-----------+-----------+-- detent position (phase 3)
//! ```
//!
//! A step is only recognised when leaving the detent, which doubles as
//! contact debouncing: bounce between two non-detent phases never counts.

use crate::config::{
    ROTARY_CCW_PHASE, ROTARY_CW_PHASE, ROTARY_DETENT_PHASE, ROTARY_MAX_MAGNITUDE,
    ROTARY_SPEED_TABLE,
};

/// Direction of one recognised step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    fn sign(self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// Translate ticks elapsed between two same-direction steps into a step
/// magnitude. Non-increasing in `count`.
pub fn speed_class(count: u8) -> i8 {
    ROTARY_SPEED_TABLE
        .iter()
        .find(|&&(above, _)| count > above)
        .map(|&(_, magnitude)| magnitude)
        .unwrap_or(ROTARY_MAX_MAGNITUDE)
}

/// Classify a phase transition. Only transitions out of the detent count.
pub fn classify(previous: u8, current: u8) -> Option<Direction> {
    if previous != ROTARY_DETENT_PHASE {
        return None;
    }
    match current {
        ROTARY_CW_PHASE => Some(Direction::Clockwise),
        ROTARY_CCW_PHASE => Some(Direction::CounterClockwise),
        _ => None,
    }
}

/// Tick-context decoder state. Owned exclusively by the tick handler.
#[derive(Clone, Debug)]
pub struct QuadratureDecoder {
    /// Phase seen on the previous tick.
    phase: u8,
    /// Ticks since the last recognised step, saturating.
    count: u8,
    /// Direction of the last recognised step.
    last: Option<Direction>,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            // Not the detent, so the very first sample can never be a step.
            phase: 0,
            count: u8::MAX,
            last: None,
        }
    }

    /// Feed one phase sample. Returns the signed step (`±1..=±4`) or 0.
    ///
    /// A reversal always yields magnitude 1 so that a quick back-and-forth
    /// does not overshoot.
    pub fn sample(&mut self, phase: u8) -> i8 {
        let phase = phase & 0b11;
        let step = match classify(self.phase, phase) {
            Some(direction) => {
                let magnitude = if self.last == Some(direction) {
                    speed_class(self.count)
                } else {
                    1
                };
                self.last = Some(direction);
                self.count = 0;
                direction.sign() * magnitude
            }
            None => {
                self.count = self.count.saturating_add(1);
                0
            }
        };
        self.phase = phase;
        step
    }

    /// Ticks since the last recognised step.
    pub fn ticks_since_step(&self) -> u8 {
        self.count
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
