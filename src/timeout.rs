//! Tick-driven timeouts without per-timeout hardware timers.
//!
//! Each timeout is a `(counter, reached flag)` pair. The main loop arms
//! and consumes, the tick handler counts down:
//!
//! | field     | written by                      | read by    |
//! |-----------|---------------------------------|------------|
//! | remaining | main (arm), tick (decrement)    | tick       |
//! | reached   | tick (set), main (arm/consume)  | main       |
//!
//! The tick handler cannot be preempted by the main loop, so its
//! decrement is atomic with respect to `arm`. The reached flag is the only
//! thing the main loop acts on; it never looks at the counter.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Named timeouts. Adding one means adding a variant and bumping `COUNT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutId {
    /// Idle time until the LCD backlight fades out.
    LcdBacklight,
}

impl TimeoutId {
    pub const COUNT: usize = 1;
    pub const ALL: [TimeoutId; Self::COUNT] = [TimeoutId::LcdBacklight];

    const fn index(self) -> usize {
        self as usize
    }
}

/// One downward counter in tick units.
pub struct Timeout {
    remaining: AtomicU16,
    reached: AtomicBool,
}

impl Timeout {
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
            reached: AtomicBool::new(false),
        }
    }

    /// (Re)start the countdown. `0` disables the timeout; it never fires
    /// immediately. Any unconsumed expiry is discarded.
    pub fn arm(&self, ticks: u16) {
        // Park the counter first so a tick landing in between cannot raise
        // the flag from the old count after we cleared it.
        self.remaining.store(0, Ordering::Release);
        self.reached.store(false, Ordering::Release);
        self.remaining.store(ticks, Ordering::Release);
    }

    /// Tick context: count down one tick. Returns `true` on the tick the
    /// counter reaches zero, and only on that tick.
    pub fn tick(&self) -> bool {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                self.reached.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    /// Test-and-clear the reached flag.
    pub fn consume(&self) -> bool {
        self.reached.swap(false, Ordering::AcqRel)
    }

    pub fn is_reached(&self) -> bool {
        self.reached.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> u16 {
        self.remaining.load(Ordering::Acquire)
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new()
    }
}

/// All timeouts of the firmware, one independent [`Timeout`] per id.
pub struct TimeoutRegistry {
    timeouts: [Timeout; TimeoutId::COUNT],
}

impl TimeoutRegistry {
    pub const fn new() -> Self {
        Self {
            timeouts: [Timeout::new()],
        }
    }

    pub fn get(&self, id: TimeoutId) -> &Timeout {
        &self.timeouts[id.index()]
    }

    pub fn arm(&self, id: TimeoutId, ticks: u16) {
        self.get(id).arm(ticks);
    }

    pub fn consume(&self, id: TimeoutId) -> bool {
        self.get(id).consume()
    }

    /// Tick context: advance every timeout. Returns `true` if at least one
    /// of them expired on this tick.
    pub fn tick(&self) -> bool {
        // Every timeout must advance, so no short-circuiting.
        self.timeouts
            .iter()
            .fold(false, |expired, timeout| timeout.tick() | expired)
    }
}

impl Default for TimeoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}
