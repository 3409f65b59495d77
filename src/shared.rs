//! State shared between the tick handler and the main loop.
//!
//! Every field fits one atomic load/store on the Cortex-M4. Ownership:
//!
//! | field         | tick handler                 | main loop                     |
//! |---------------|------------------------------|-------------------------------|
//! | rotation      | stores each recognised step  | takes (swap to 0)             |
//! | buttons       | stores history every tick    | reads                         |
//! | button_events | ORs in rising edges          | takes (swap to 0)             |
//! | semaphore     | clears `PWM_*_PENDING` only  | sets/clears everything else   |
//! | timeouts      | counts down, raises flags    | arms, consumes flags          |
//! | duty          | reads pending channels       | writes, then raises pending   |
//!
//! No lock is ever taken in tick context.

use core::sync::atomic::{AtomicI8, AtomicU16, AtomicU8, Ordering};

use crate::input::ButtonHistory;
use crate::pwm::{Channel, PwmGroup};
use crate::timeout::TimeoutRegistry;

/// Semaphore bits requesting service from the tick handler.
///
/// The ongoing bits keep the main loop waking every tick until the main
/// loop itself clears them. The pending bits ask the tick handler to
/// commit staged duty values and are cleared by it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags(u8);

impl Flags {
    pub const FADE_IN: Flags = Flags(0x01);
    pub const FADE_OUT: Flags = Flags(0x02);
    pub const RAINBOW: Flags = Flags(0x04);
    pub const PWM_LCD_PENDING: Flags = Flags(0x10);
    pub const PWM_RGB_PENDING: Flags = Flags(0x20);

    /// Bits that are never cleared in tick context.
    pub const ONGOING: Flags = Flags(0x07);
    /// Bits consumed by the PWM commit.
    pub const PENDING: Flags = Flags(0x30);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Flags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Atomic bit set of [`Flags`].
pub struct Semaphore(AtomicU8);

impl Semaphore {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn set(&self, flags: Flags) {
        self.0.fetch_or(flags.0, Ordering::AcqRel);
    }

    pub fn clear(&self, flags: Flags) {
        self.0.fetch_and(!flags.0, Ordering::AcqRel);
    }

    pub fn load(&self) -> Flags {
        Flags(self.0.load(Ordering::Acquire))
    }

    pub fn contains(&self, flags: Flags) -> bool {
        self.load().contains(flags)
    }

    /// Clear `flags` and return which of them were set.
    pub fn take(&self, flags: Flags) -> Flags {
        Flags(self.0.fetch_and(!flags.0, Ordering::AcqRel) & flags.0)
    }

    /// Any ongoing animation asking to be woken on every tick.
    pub fn has_ongoing(&self) -> bool {
        self.load().intersects(Flags::ONGOING)
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete cross-context record.
pub struct SharedState {
    rotation: AtomicI8,
    buttons: AtomicU8,
    button_events: AtomicU8,
    pub semaphore: Semaphore,
    pub timeouts: TimeoutRegistry,
    duty: [AtomicU16; Channel::COUNT],
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            rotation: AtomicI8::new(0),
            buttons: AtomicU8::new(0),
            button_events: AtomicU8::new(0),
            semaphore: Semaphore::new(),
            timeouts: TimeoutRegistry::new(),
            duty: [
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
            ],
        }
    }

    // Rotation

    /// Tick context: publish a recognised step. An unconsumed earlier step
    /// is overwritten. Ticks without a step leave it pending for the main loop.
    pub fn publish_rotation(&self, step: i8) {
        self.rotation.store(step, Ordering::Release);
    }

    /// Main loop: read and clear the pending step.
    pub fn take_rotation(&self) -> i8 {
        self.rotation.swap(0, Ordering::AcqRel)
    }

    // Buttons

    /// Tick context: publish this tick's history and latch rising edges.
    pub fn publish_buttons(&self, history: ButtonHistory) {
        self.buttons.store(history.bits(), Ordering::Release);
        let rising = history.rising_edges();
        if rising != 0 {
            self.button_events.fetch_or(rising, Ordering::AcqRel);
        }
    }

    pub fn buttons(&self) -> ButtonHistory {
        ButtonHistory::from_bits(self.buttons.load(Ordering::Acquire))
    }

    /// Main loop: rising edges latched since the last call, as
    /// `ButtonHistory::*_NEW` bits.
    pub fn take_button_presses(&self) -> u8 {
        self.button_events.swap(0, Ordering::AcqRel)
    }

    // PWM staging

    /// Main loop: stage a duty value; it becomes visible on the output at
    /// the next period boundary.
    pub fn stage_duty(&self, channel: Channel, duty: u16) {
        self.duty[channel.index()].store(duty, Ordering::Relaxed);
        // Release publishes the duty before the pending bit.
        self.semaphore.set(channel.group().pending_flag());
    }

    /// Main loop: stage red, green and blue together. The tick handler never
    /// sees a mix of old and new strip values.
    pub fn stage_strip(&self, duty: [u16; 3]) {
        // An older stage may still be pending; withdraw it while storing.
        self.semaphore.clear(Flags::PWM_RGB_PENDING);
        for (channel, value) in Channel::RGB.into_iter().zip(duty) {
            self.duty[channel.index()].store(value, Ordering::Relaxed);
        }
        self.semaphore.set(Flags::PWM_RGB_PENDING);
    }

    /// Last staged duty of `channel`.
    pub fn staged_duty(&self, channel: Channel) -> u16 {
        self.duty[channel.index()].load(Ordering::Acquire)
    }

    /// Tick context: claim the groups with pending duty values.
    pub(crate) fn take_pending_groups(&self) -> [Option<PwmGroup>; 2] {
        let pending = self.semaphore.take(Flags::PENDING);
        let claim = |group: PwmGroup| pending.contains(group.pending_flag()).then_some(group);
        [claim(PwmGroup::Backlight), claim(PwmGroup::Strip)]
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
