//! LCD backlight fades.
//!
//! Brightness is a perceptual value in `0..=0xFFFF` that goes through
//! [`brightness_to_pwm`] before it is staged. Each main-loop pass with a
//! fade flag set moves it one step; the flag stays set (and keeps the main
//! loop waking every tick) until the bound is hit.

use crate::color::brightness_to_pwm;
use crate::config::{FADE_IN_STEP, FADE_OUT_STEP};
use crate::pwm::Channel;
use crate::shared::{Flags, Semaphore, SharedState};

/// Fade direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fade {
    In,
    Out,
}

impl Fade {
    const fn flag(self) -> Flags {
        match self {
            Fade::In => Flags::FADE_IN,
            Fade::Out => Flags::FADE_OUT,
        }
    }

    const fn opposite(self) -> Fade {
        match self {
            Fade::In => Fade::Out,
            Fade::Out => Fade::In,
        }
    }
}

/// Owns the backlight brightness and ramps it on request.
#[derive(Clone, Debug, Default)]
pub struct FadeSequencer {
    brightness: u16,
}

impl FadeSequencer {
    pub const fn new() -> Self {
        Self { brightness: 0 }
    }

    /// Start with a given brightness (no flag involved).
    pub const fn with_brightness(brightness: u16) -> Self {
        Self { brightness }
    }

    pub fn brightness(&self) -> u16 {
        self.brightness
    }

    /// Begin fading in `direction`, cancelling the opposite fade.
    pub fn start(&self, semaphore: &Semaphore, direction: Fade) {
        semaphore.clear(direction.opposite().flag());
        semaphore.set(direction.flag());
    }

    pub fn start_fade_in(&self, semaphore: &Semaphore) {
        self.start(semaphore, Fade::In);
    }

    pub fn start_fade_out(&self, semaphore: &Semaphore) {
        self.start(semaphore, Fade::Out);
    }

    /// The fade currently running, if any.
    pub fn active(&self, semaphore: &Semaphore) -> Option<Fade> {
        let flags = semaphore.load();
        if flags.contains(Flags::FADE_IN) {
            Some(Fade::In)
        } else if flags.contains(Flags::FADE_OUT) {
            Some(Fade::Out)
        } else {
            None
        }
    }

    /// One main-loop pass: advance the active fade by one step and stage
    /// the resulting backlight duty. Returns the direction stepped.
    pub fn step(&mut self, shared: &SharedState) -> Option<Fade> {
        let direction = self.active(&shared.semaphore)?;
        let (next, done) = match direction {
            Fade::In => match self.brightness.checked_add(FADE_IN_STEP) {
                Some(b) if b < u16::MAX => (b, false),
                _ => (u16::MAX, true),
            },
            Fade::Out => match self.brightness.checked_sub(FADE_OUT_STEP) {
                Some(b) if b > 0 => (b, false),
                _ => (0, true),
            },
        };
        self.brightness = next;

        if done {
            shared.semaphore.clear(direction.flag());
            debug!("Fade: {:?} complete", direction);
        }
        shared.stage_duty(Channel::LcdBacklight, brightness_to_pwm(next));
        Some(direction)
    }
}
