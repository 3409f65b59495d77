//! nRF52840 bindings for the tick handler: PWM outputs, input pins and
//! the tick timer.

use blinkenlights::config::{PWM_COUNTER_TOP, TICK_PERIOD_US};
use blinkenlights::input::InputSample;
use blinkenlights::pwm::{scale_duty, Channel, PwmGroup, PwmHardware};
use embassy_nrf::gpio::Input;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::pac;
use embassy_nrf::peripherals;
use embassy_nrf::pwm::{Prescaler, SimplePwm};

/// All four outputs on PWM0: channel 0 is the LCD backlight, 1..3 the strip.
pub struct NrfPwm {
    pwm: SimplePwm<'static, peripherals::PWM0>,
}

impl NrfPwm {
    pub fn new(mut pwm: SimplePwm<'static, peripherals::PWM0>) -> Self {
        pwm.set_prescaler(Prescaler::Div1);
        pwm.set_max_duty(PWM_COUNTER_TOP);
        for channel in Channel::ALL {
            pwm.set_duty(channel.index(), 0);
        }
        Self { pwm }
    }
}

// The PWM peripheral drives full PWM on every channel and latches new
// compare values at the end of the running period on its own, so the
// output reset and halt/resume steps have nothing to do here.
impl PwmHardware for NrfPwm {
    fn reset_outputs(&mut self, _group: PwmGroup) {}

    fn halt(&mut self, _group: PwmGroup) {}

    fn load(&mut self, channel: Channel, duty: u16) {
        self.pwm
            .set_duty(channel.index(), scale_duty(duty, PWM_COUNTER_TOP));
    }

    fn resume(&mut self, _group: PwmGroup) {}
}

/// Encoder contacts and buttons, all active-low with pull-ups.
pub struct Inputs {
    pub encoder_a: Input<'static>,
    pub encoder_b: Input<'static>,
    pub encoder_push: Input<'static>,
    pub back: Input<'static>,
}

impl Inputs {
    pub fn sample(&self) -> InputSample {
        let phase = self.encoder_a.is_high() as u8 | ((self.encoder_b.is_high() as u8) << 1);
        InputSample {
            phase,
            encoder_high: self.encoder_push.is_high(),
            back_high: self.back.is_high(),
        }
    }
}

/// Start TIMER1 as the tick source: 1 MHz, cleared on compare 0, one
/// interrupt per period.
pub fn start_tick_timer(_timer: peripherals::TIMER1) {
    let regs = pac::TIMER1;
    regs.tasks_stop().write_value(1);
    regs.mode()
        .write(|w| w.set_mode(pac::timer::vals::Mode::TIMER));
    regs.bitmode()
        .write(|w| w.set_bitmode(pac::timer::vals::Bitmode::_32BIT));
    // 16 MHz / 2^4
    regs.prescaler().write(|w| w.set_prescaler(4));
    regs.cc(0).write_value(TICK_PERIOD_US);
    regs.shorts().write(|w| w.set_compare_clear(0, true));
    regs.events_compare(0).write_value(0);
    regs.intenset().write(|w| w.set_compare(0, true));

    interrupt::TIMER1.set_priority(Priority::P2);
    interrupt::TIMER1.unpend();
    unsafe { interrupt::TIMER1.enable() };

    regs.tasks_clear().write_value(1);
    regs.tasks_start().write_value(1);
}

/// Acknowledge the tick interrupt.
pub fn clear_tick_event() {
    pac::TIMER1.events_compare(0).write_value(0);
}
