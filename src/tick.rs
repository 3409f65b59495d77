//! The periodic tick handler body.
//!
//! Runs once per timer period in interrupt context, to completion, without
//! locks or logging. Fixed order within one tick:
//!
//! 1. commit staged PWM values (so a value staged on the last main-loop
//!    pass is never more than one tick late)
//! 2. count down timeouts
//! 3. sample the rotary encoder
//! 4. sample the buttons
//! 5. decide about waking the main loop, using this tick's results

use crate::input::{ButtonHistory, InputSample, QuadratureDecoder};
use crate::power_logic::{should_wake, WakeSources};
use crate::pwm::{self, PwmHardware};
use crate::shared::SharedState;

/// Tick-context state that never leaves the interrupt handler.
#[derive(Clone, Debug, Default)]
pub struct TickHandler {
    decoder: QuadratureDecoder,
    buttons: ButtonHistory,
}

impl TickHandler {
    pub const fn new() -> Self {
        Self {
            decoder: QuadratureDecoder::new(),
            buttons: ButtonHistory::from_bits(0),
        }
    }

    /// Process one tick. Returns `true` if the main loop must be woken.
    pub fn on_tick<H: PwmHardware>(
        &mut self,
        shared: &SharedState,
        hw: &mut H,
        sample: InputSample,
    ) -> bool {
        pwm::commit(shared, hw);

        let timeout = shared.timeouts.tick();

        let step = self.decoder.sample(sample.phase);
        if step != 0 {
            shared.publish_rotation(step);
        }

        self.buttons = self.buttons.shift_in(sample.encoder_high, sample.back_high);
        shared.publish_buttons(self.buttons);

        should_wake(WakeSources {
            rotation: step != 0,
            button_edge: self.buttons.any_edge(),
            timeout,
            ongoing: shared.semaphore.has_ongoing(),
        })
    }

    pub fn buttons(&self) -> ButtonHistory {
        self.buttons
    }

    pub fn decoder(&self) -> &QuadratureDecoder {
        &self.decoder
    }
}
