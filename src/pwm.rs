//! PWM output scheduling: duty values staged by the main loop are
//! committed by the tick handler at the period boundary.
//!
//! ## Output trick
//!
//! The timer compare units can only *set* their output at the compare
//! point (one compare slot lacks a set/reset mode altogether). Every period
//! the scheduler therefore forces all outputs back to their reset level
//! by toggling the output mode (set, then restore) before the timer
//! re-asserts them, so every channel behaves like full PWM regardless of
//! the slot it sits on.
//!
//! ## Flicker-free updates
//!
//! A compare value written after the counter has already passed it would
//! skip the whole period. New values are therefore only loaded right
//! after the group's counter has been halted and cleared to zero, then
//! counting restarts. A starved commit shows one stale period at worst.

use crate::config::PWM_MAX_DUTY;
use crate::shared::{Flags, SharedState};

/// The four output channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    LcdBacklight,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const COUNT: usize = 4;
    pub const ALL: [Channel; Self::COUNT] =
        [Channel::LcdBacklight, Channel::Red, Channel::Green, Channel::Blue];
    pub const RGB: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn group(self) -> PwmGroup {
        match self {
            Channel::LcdBacklight => PwmGroup::Backlight,
            Channel::Red | Channel::Green | Channel::Blue => PwmGroup::Strip,
        }
    }
}

/// Channels that share one timer and are updated together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmGroup {
    /// LCD backlight.
    Backlight,
    /// RGB strip.
    Strip,
}

impl PwmGroup {
    pub const fn pending_flag(self) -> Flags {
        match self {
            PwmGroup::Backlight => Flags::PWM_LCD_PENDING,
            PwmGroup::Strip => Flags::PWM_RGB_PENDING,
        }
    }

    pub fn channels(self) -> &'static [Channel] {
        match self {
            PwmGroup::Backlight => &[Channel::LcdBacklight],
            PwmGroup::Strip => &Channel::RGB,
        }
    }
}

/// Timer/compare hardware as seen from the tick handler.
pub trait PwmHardware {
    /// Force every output of `group` to its reset level by toggling the
    /// compare output mode and restoring it.
    fn reset_outputs(&mut self, group: PwmGroup);

    /// Stop the group's counter and clear it to zero.
    fn halt(&mut self, group: PwmGroup);

    /// Load a compare value for `channel`. Only called between
    /// [`halt`](Self::halt) and [`resume`](Self::resume).
    fn load(&mut self, channel: Channel, duty: u16);

    /// Restart counting from zero.
    fn resume(&mut self, group: PwmGroup);
}

/// Map a full-scale duty onto a counter that wraps at `top`, rounding to
/// nearest so that 0 and full scale stay exact.
pub fn scale_duty(duty: u16, top: u16) -> u16 {
    let max = PWM_MAX_DUTY as u32;
    ((duty as u32 * top as u32 + max / 2) / max) as u16
}

/// Tick context: run the per-period output reset and commit whatever the
/// main loop staged since the previous tick.
///
/// Returns the groups that received new values.
pub fn commit<H: PwmHardware>(shared: &SharedState, hw: &mut H) -> [Option<PwmGroup>; 2] {
    hw.reset_outputs(PwmGroup::Backlight);
    hw.reset_outputs(PwmGroup::Strip);

    let pending = shared.take_pending_groups();
    for group in pending.iter().flatten().copied() {
        hw.halt(group);
        for &channel in group.channels() {
            hw.load(channel, shared.staged_duty(channel));
        }
        hw.resume(group);
    }
    pending
}
