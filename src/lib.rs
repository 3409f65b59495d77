//! Host-testable core of the blinkenlights firmware.
//!
//! Everything that does not touch a peripheral lives here: the tick
//! handler body, the state shared with the main loop, the menu state
//! machine, fades, color math and the settings record. The embedded
//! binary (`main.rs`, feature `embedded`) only binds it to the nRF52840.
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! This lib.rs builds for both the host and the target.

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are used by the modules below.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Tick Context
// ═══════════════════════════════════════════════════════════════════════════

pub mod input;
pub mod power_logic;
pub mod pwm;
pub mod shared;
pub mod tick;
pub mod timeout;

// ═══════════════════════════════════════════════════════════════════════════
// Main Loop
// ═══════════════════════════════════════════════════════════════════════════

pub mod app;
pub mod color;
pub mod fade;
pub mod lcd;
pub mod menu;
pub mod settings;
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Ambient
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::app::{idle_timeout_ticks, strip_color, Controller};
    use super::color::*;
    use super::config::*;
    use super::error::Error;
    use super::fade::{Fade, FadeSequencer};
    use super::input::quadrature::{classify, speed_class, Direction};
    use super::input::{Button, ButtonHistory, InputSample, QuadratureDecoder};
    use super::lcd::{ddram_address, rom_code, TextSink};
    use super::power_logic::{should_wake, WakeSources};
    use super::pwm::{commit, scale_duty, Channel, PwmGroup, PwmHardware};
    use super::settings::{ColorMode, Settings, SETTINGS_RECORD_SIZE};
    use super::shared::{Flags, SharedState};
    use super::tick::TickHandler;
    use super::timeout::{Timeout, TimeoutId, TimeoutRegistry};

    // ════════════════════════════════════════════════════════════════════════
    // Fakes
    // ════════════════════════════════════════════════════════════════════════

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum HwOp {
        Reset(PwmGroup),
        Halt(PwmGroup),
        Load(Channel, u16),
        Resume(PwmGroup),
    }

    #[derive(Default)]
    struct RecordingPwm {
        ops: Vec<HwOp>,
    }

    impl PwmHardware for RecordingPwm {
        fn reset_outputs(&mut self, group: PwmGroup) {
            self.ops.push(HwOp::Reset(group));
        }

        fn halt(&mut self, group: PwmGroup) {
            self.ops.push(HwOp::Halt(group));
        }

        fn load(&mut self, channel: Channel, duty: u16) {
            self.ops.push(HwOp::Load(channel, duty));
        }

        fn resume(&mut self, group: PwmGroup) {
            self.ops.push(HwOp::Resume(group));
        }
    }

    struct NullLcd;

    impl TextSink for NullLcd {
        fn clear(&mut self) {}
        fn write_at(&mut self, _col: u8, _row: u8, _text: &str) {}
    }

    fn sample(phase: u8) -> InputSample {
        InputSample { phase, ..InputSample::IDLE }
    }

    /// Rest in the detent for `idle` ticks, then leave it in `direction`.
    fn turn(decoder: &mut QuadratureDecoder, idle: usize, phase: u8) -> i8 {
        for _ in 0..idle {
            assert_eq!(decoder.sample(ROTARY_DETENT_PHASE), 0);
        }
        decoder.sample(phase)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Quadrature Decoder Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn step_only_when_leaving_detent() {
        for previous in 0..4u8 {
            for current in 0..4u8 {
                let expected = match (previous, current) {
                    (ROTARY_DETENT_PHASE, ROTARY_CW_PHASE) => Some(Direction::Clockwise),
                    (ROTARY_DETENT_PHASE, ROTARY_CCW_PHASE) => Some(Direction::CounterClockwise),
                    _ => None,
                };
                assert_eq!(classify(previous, current), expected, "{} -> {}", previous, current);
            }
        }
    }

    #[test]
    fn slow_clockwise_turns_give_single_steps() {
        let mut decoder = QuadratureDecoder::new();
        let steps: Vec<i8> = [3u8, 2, 3, 2]
            .iter()
            .flat_map(|&phase| {
                let idle = if phase == ROTARY_CW_PHASE { 0 } else { 60 };
                (0..idle)
                    .map(|_| ROTARY_DETENT_PHASE)
                    .chain(core::iter::once(phase))
                    .collect::<Vec<_>>()
            })
            .map(|phase| decoder.sample(phase))
            .filter(|&step| step != 0)
            .collect();

        assert_eq!(steps, vec![1, 1]);
    }

    #[test]
    fn fast_turns_accelerate() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(turn(&mut decoder, 1, ROTARY_CW_PHASE), 1);
        assert_eq!(turn(&mut decoder, 30, ROTARY_CW_PHASE), 2);
        assert_eq!(turn(&mut decoder, 15, ROTARY_CW_PHASE), 3);
        assert_eq!(turn(&mut decoder, 5, ROTARY_CW_PHASE), 4);
        assert_eq!(turn(&mut decoder, 100, ROTARY_CW_PHASE), 1);
    }

    #[test]
    fn counter_clockwise_is_negative() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(turn(&mut decoder, 1, ROTARY_CCW_PHASE), -1);
        assert_eq!(turn(&mut decoder, 5, ROTARY_CCW_PHASE), -4);
    }

    #[test]
    fn reversal_is_always_magnitude_one() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(turn(&mut decoder, 1, ROTARY_CW_PHASE), 1);
        assert_eq!(turn(&mut decoder, 1, ROTARY_CW_PHASE), 4);
        assert_eq!(turn(&mut decoder, 1, ROTARY_CCW_PHASE), -1);
        assert_eq!(turn(&mut decoder, 1, ROTARY_CW_PHASE), 1);
    }

    #[test]
    fn speed_class_is_non_increasing() {
        let mut previous = speed_class(0);
        assert_eq!(previous, ROTARY_MAX_MAGNITUDE);
        for count in 1..=u8::MAX {
            let magnitude = speed_class(count);
            assert!(magnitude <= previous, "count {}", count);
            assert!(magnitude >= 1);
            previous = magnitude;
        }
        assert_eq!(speed_class(51), 1);
        assert_eq!(speed_class(50), 2);
    }

    #[test]
    fn bounce_outside_detent_is_ignored() {
        let mut decoder = QuadratureDecoder::new();
        for &phase in &[2u8, 0, 2, 0, 1, 0, 1, 2] {
            assert_eq!(decoder.sample(phase), 0);
        }
    }

    #[test]
    fn first_sample_never_steps() {
        let mut decoder = QuadratureDecoder::new();
        assert_eq!(decoder.sample(ROTARY_CW_PHASE), 0);
    }

    #[test]
    fn inter_step_counter_saturates() {
        let mut decoder = QuadratureDecoder::new();
        turn(&mut decoder, 1, ROTARY_CW_PHASE);
        for _ in 0..1000 {
            decoder.sample(ROTARY_DETENT_PHASE);
        }
        assert_eq!(decoder.ticks_since_step(), u8::MAX);
        assert_eq!(decoder.sample(ROTARY_CW_PHASE), 1);
        assert_eq!(decoder.ticks_since_step(), 0);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Button Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn press_and_release_give_one_edge_each() {
        let idle = ButtonHistory::default().shift_in(true, true);
        assert!(!idle.any_edge());

        let pressed = idle.shift_in(false, true);
        assert!(pressed.rose(Button::Encoder));
        assert!(pressed.is_pressed(Button::Encoder));
        assert!(!pressed.rose(Button::Back));
        assert_eq!(pressed.rising_edges(), ButtonHistory::ENCODER_NEW);

        let held = pressed.shift_in(false, true);
        assert!(!held.any_edge());
        assert_eq!(held.rising_edges(), 0);

        let released = held.shift_in(true, true);
        assert!(released.fell(Button::Encoder));
        assert!(released.any_edge());
        assert_eq!(released.rising_edges(), 0);
    }

    #[test]
    fn both_buttons_tracked_independently() {
        let history = ButtonHistory::default()
            .shift_in(true, false)
            .shift_in(false, false);

        assert!(history.rose(Button::Encoder));
        assert!(!history.rose(Button::Back));
        assert!(history.is_pressed(Button::Back));
        assert_eq!(
            history.bits(),
            ButtonHistory::ENCODER_NEW | ButtonHistory::BACK_NEW | ButtonHistory::BACK_OLD
        );
    }

    #[test]
    fn history_shifts_exactly_one_tick() {
        let history = ButtonHistory::from_bits(ButtonHistory::BACK_NEW | ButtonHistory::ENCODER_OLD);
        let next = history.shift_in(true, true);
        assert_eq!(next.bits(), ButtonHistory::BACK_OLD);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Timeout Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn timeout_fires_after_armed_ticks() {
        let timeout = Timeout::new();
        timeout.arm(3);

        assert!(!timeout.tick());
        assert!(!timeout.tick());
        assert!(!timeout.is_reached());
        assert!(timeout.tick());
        assert!(timeout.is_reached());

        assert!(timeout.consume());
        assert!(!timeout.is_reached());
        assert!(!timeout.consume());
    }

    #[test]
    fn timeout_fires_once_per_arm() {
        let timeout = Timeout::new();
        timeout.arm(1);
        assert!(timeout.tick());
        assert!(timeout.consume());

        for _ in 0..10 {
            assert!(!timeout.tick());
        }
        assert_eq!(timeout.remaining(), 0);
        assert!(!timeout.consume());
    }

    #[test]
    fn zero_disables_timeout() {
        let timeout = Timeout::new();
        timeout.arm(0);
        for _ in 0..10 {
            assert!(!timeout.tick());
        }
        assert!(!timeout.is_reached());
    }

    #[test]
    fn rearming_discards_unconsumed_expiry() {
        let timeout = Timeout::new();
        timeout.arm(1);
        timeout.tick();
        assert!(timeout.is_reached());

        timeout.arm(5);
        assert!(!timeout.is_reached());
        assert_eq!(timeout.remaining(), 5);
    }

    #[test]
    fn registry_ticks_every_timeout() {
        let registry = TimeoutRegistry::new();
        registry.arm(TimeoutId::LcdBacklight, 2);
        assert!(!registry.tick());
        assert!(registry.tick());
        assert!(registry.consume(TimeoutId::LcdBacklight));
        assert!(!registry.consume(TimeoutId::LcdBacklight));
        assert_eq!(TimeoutId::ALL.len(), TimeoutId::COUNT);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Shared State Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn rotation_is_taken_once() {
        let shared = SharedState::new();
        shared.publish_rotation(-2);
        assert_eq!(shared.take_rotation(), -2);
        assert_eq!(shared.take_rotation(), 0);
    }

    #[test]
    fn button_presses_latch_until_taken() {
        let shared = SharedState::new();
        let pressed = ButtonHistory::default().shift_in(false, true);
        shared.publish_buttons(pressed);
        shared.publish_buttons(pressed.shift_in(false, true));

        assert!(shared.buttons().is_pressed(Button::Encoder));
        assert_eq!(shared.take_button_presses(), ButtonHistory::ENCODER_NEW);
        assert_eq!(shared.take_button_presses(), 0);
    }

    #[test]
    fn staging_raises_group_pending_flag() {
        let shared = SharedState::new();
        shared.stage_duty(Channel::Green, 1234);

        assert!(shared.semaphore.contains(Flags::PWM_RGB_PENDING));
        assert!(!shared.semaphore.contains(Flags::PWM_LCD_PENDING));
        assert_eq!(shared.staged_duty(Channel::Green), 1234);

        shared.stage_duty(Channel::LcdBacklight, 99);
        assert!(shared.semaphore.contains(Flags::PWM_LCD_PENDING));
    }

    #[test]
    fn semaphore_take_returns_only_requested_bits() {
        let shared = SharedState::new();
        shared.semaphore.set(Flags::FADE_IN.union(Flags::PWM_LCD_PENDING));

        let taken = shared.semaphore.take(Flags::PENDING);
        assert_eq!(taken, Flags::PWM_LCD_PENDING);
        assert_eq!(shared.semaphore.load(), Flags::FADE_IN);
        assert!(shared.semaphore.has_ongoing());
    }

    // ════════════════════════════════════════════════════════════════════════
    // PWM Commit Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn commit_without_pending_only_resets_outputs() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();

        assert_eq!(commit(&shared, &mut hw), [None, None]);
        assert_eq!(
            hw.ops,
            vec![HwOp::Reset(PwmGroup::Backlight), HwOp::Reset(PwmGroup::Strip)]
        );
    }

    #[test]
    fn commit_loads_only_between_halt_and_resume() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        shared.stage_duty(Channel::Red, 100);
        shared.stage_duty(Channel::Blue, 300);

        assert_eq!(commit(&shared, &mut hw), [None, Some(PwmGroup::Strip)]);
        assert_eq!(
            hw.ops,
            vec![
                HwOp::Reset(PwmGroup::Backlight),
                HwOp::Reset(PwmGroup::Strip),
                HwOp::Halt(PwmGroup::Strip),
                HwOp::Load(Channel::Red, 100),
                HwOp::Load(Channel::Green, 0),
                HwOp::Load(Channel::Blue, 300),
                HwOp::Resume(PwmGroup::Strip),
            ]
        );
        assert!(!shared.semaphore.load().intersects(Flags::PENDING));
    }

    #[test]
    fn commit_is_one_shot() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        shared.stage_duty(Channel::LcdBacklight, 5000);

        assert_eq!(commit(&shared, &mut hw), [Some(PwmGroup::Backlight), None]);
        hw.ops.clear();
        assert_eq!(commit(&shared, &mut hw), [None, None]);
        assert!(!hw.ops.iter().any(|op| matches!(op, HwOp::Load(..))));
    }

    #[test]
    fn last_staged_value_wins() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        shared.stage_duty(Channel::LcdBacklight, 1);
        shared.stage_duty(Channel::LcdBacklight, 2);

        commit(&shared, &mut hw);
        assert!(hw.ops.contains(&HwOp::Load(Channel::LcdBacklight, 2)));
        assert!(!hw.ops.contains(&HwOp::Load(Channel::LcdBacklight, 1)));
    }

    #[test]
    fn strip_is_committed_as_one_color() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        shared.stage_strip([1000, 1000, 1000]);
        commit(&shared, &mut hw);
        hw.ops.clear();

        shared.stage_strip([1000, 2000, 3000]);
        assert_eq!(commit(&shared, &mut hw), [None, Some(PwmGroup::Strip)]);
        assert_eq!(
            hw.ops[2..],
            [
                HwOp::Halt(PwmGroup::Strip),
                HwOp::Load(Channel::Red, 1000),
                HwOp::Load(Channel::Green, 2000),
                HwOp::Load(Channel::Blue, 3000),
                HwOp::Resume(PwmGroup::Strip),
            ]
        );
    }

    #[test]
    fn strip_stage_replaces_an_uncommitted_channel() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        shared.stage_duty(Channel::Red, 7);
        shared.stage_strip([10, 20, 30]);

        commit(&shared, &mut hw);
        assert!(hw.ops.contains(&HwOp::Load(Channel::Red, 10)));
        assert!(!hw.ops.contains(&HwOp::Load(Channel::Red, 7)));
        assert!(!shared.semaphore.load().intersects(Flags::PENDING));
    }

    #[test]
    fn scale_duty_keeps_endpoints() {
        assert_eq!(scale_duty(0, PWM_COUNTER_TOP), 0);
        assert_eq!(scale_duty(u16::MAX, PWM_COUNTER_TOP), PWM_COUNTER_TOP);
        assert_eq!(scale_duty(u16::MAX / 2, 1000), 500);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Tick Handler Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn idle_tick_does_not_wake() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();

        for _ in 0..5 {
            assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        }
    }

    #[test]
    fn rotation_step_wakes_and_is_published() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();
        tick.on_tick(&shared, &mut hw, InputSample::IDLE);

        assert!(tick.on_tick(&shared, &mut hw, sample(ROTARY_CW_PHASE)));
        // Returning to the detent is not a step and must not clobber it.
        assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        assert_eq!(shared.take_rotation(), 1);
    }

    #[test]
    fn button_edges_wake() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();
        tick.on_tick(&shared, &mut hw, InputSample::IDLE);

        let pressed = InputSample { back_high: false, ..InputSample::IDLE };
        assert!(tick.on_tick(&shared, &mut hw, pressed));
        assert!(!tick.on_tick(&shared, &mut hw, pressed));
        assert!(tick.on_tick(&shared, &mut hw, InputSample::IDLE));

        assert_eq!(shared.take_button_presses(), ButtonHistory::BACK_NEW);
        assert!(tick.buttons().fell(Button::Back));
    }

    #[test]
    fn timeout_expiry_wakes_once() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();
        shared.timeouts.arm(TimeoutId::LcdBacklight, 2);

        assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        assert!(tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        assert!(shared.timeouts.consume(TimeoutId::LcdBacklight));
    }

    #[test]
    fn ongoing_flag_wakes_every_tick_until_cleared() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();
        shared.semaphore.set(Flags::RAINBOW);

        for _ in 0..10 {
            assert!(tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        }
        assert!(shared.semaphore.contains(Flags::RAINBOW));

        shared.semaphore.clear(Flags::RAINBOW);
        assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
    }

    #[test]
    fn staged_duty_committed_on_next_tick() {
        let shared = SharedState::new();
        let mut hw = RecordingPwm::default();
        let mut tick = TickHandler::new();

        shared.stage_duty(Channel::LcdBacklight, 777);
        // Pending flags alone never wake the main loop.
        assert!(!tick.on_tick(&shared, &mut hw, InputSample::IDLE));
        assert!(hw.ops.contains(&HwOp::Load(Channel::LcdBacklight, 777)));
    }

    #[test]
    fn wake_sources_are_ored() {
        assert!(!should_wake(WakeSources::default()));
        assert!(should_wake(WakeSources { rotation: true, ..WakeSources::default() }));
        assert!(should_wake(WakeSources { button_edge: true, ..WakeSources::default() }));
        assert!(should_wake(WakeSources { timeout: true, ..WakeSources::default() }));
        assert!(should_wake(WakeSources { ongoing: true, ..WakeSources::default() }));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Fade Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn fade_in_saturates_and_clears_flag() {
        let shared = SharedState::new();
        let mut fade = FadeSequencer::new();
        fade.start_fade_in(&shared.semaphore);

        let expected_steps = (u16::MAX as u32).div_ceil(FADE_IN_STEP as u32);
        for _ in 1..expected_steps {
            assert_eq!(fade.step(&shared), Some(Fade::In));
            assert!(fade.brightness() < u16::MAX);
            assert!(shared.semaphore.contains(Flags::FADE_IN));
        }
        assert_eq!(fade.step(&shared), Some(Fade::In));
        assert_eq!(fade.brightness(), u16::MAX);
        assert!(!shared.semaphore.contains(Flags::FADE_IN));

        assert_eq!(fade.step(&shared), None);
        assert_eq!(fade.brightness(), u16::MAX);
    }

    #[test]
    fn fade_out_reaches_zero() {
        let shared = SharedState::new();
        let mut fade = FadeSequencer::with_brightness(u16::MAX);
        fade.start_fade_out(&shared.semaphore);

        let mut steps = 0;
        while fade.step(&shared).is_some() {
            steps += 1;
            assert!(steps <= 1000);
        }
        assert_eq!(fade.brightness(), 0);
        assert_eq!(steps, (u16::MAX as u32).div_ceil(FADE_OUT_STEP as u32));
    }

    #[test]
    fn fade_out_cancels_fade_in() {
        let shared = SharedState::new();
        let mut fade = FadeSequencer::new();
        fade.start_fade_in(&shared.semaphore);
        fade.step(&shared);
        fade.step(&shared);
        let peak = fade.brightness();

        fade.start_fade_out(&shared.semaphore);
        assert!(!shared.semaphore.contains(Flags::FADE_IN));
        assert_eq!(fade.active(&shared.semaphore), Some(Fade::Out));

        assert_eq!(fade.step(&shared), Some(Fade::Out));
        assert!(fade.brightness() < peak);
    }

    #[test]
    fn fade_step_stages_backlight_curve() {
        let shared = SharedState::new();
        let mut fade = FadeSequencer::new();
        fade.start_fade_in(&shared.semaphore);
        fade.step(&shared);

        assert!(shared.semaphore.contains(Flags::PWM_LCD_PENDING));
        assert!(!shared.semaphore.contains(Flags::PWM_RGB_PENDING));
        assert_eq!(
            shared.staged_duty(Channel::LcdBacklight),
            brightness_to_pwm(fade.brightness())
        );
    }

    #[test]
    fn idle_fade_stages_nothing() {
        let shared = SharedState::new();
        let mut fade = FadeSequencer::new();
        assert_eq!(fade.step(&shared), None);
        assert!(shared.semaphore.load().is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Color Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn brightness_curve_endpoints_and_monotone() {
        assert_eq!(brightness_to_pwm(0), 0);
        assert_eq!(brightness_to_pwm(u16::MAX), u16::MAX);

        let mut previous = 0;
        for b in (0..=u16::MAX).step_by(257) {
            let pwm = brightness_to_pwm(b);
            assert!(pwm >= previous);
            previous = pwm;
        }
        assert!(brightness_to_pwm(u16::MAX / 2) < u16::MAX / 2);
    }

    #[test]
    fn percent_conversions() {
        assert_eq!(percent_to_full(0), 0);
        assert_eq!(percent_to_full(100), u16::MAX);
        assert_eq!(percent_to_full(250), u16::MAX);
        assert_eq!(full_to_percent(u16::MAX), 100);
        assert_eq!(full_to_percent(percent_to_full(37)), 37);
    }

    #[test]
    fn hsv_primaries() {
        let full = u16::MAX;
        assert_eq!(hsv_to_rgb(Hsv::new(0, 100, 100)), Rgb::new(full, 0, 0));
        assert_eq!(hsv_to_rgb(Hsv::new(60, 100, 100)), Rgb::new(full, full, 0));
        assert_eq!(hsv_to_rgb(Hsv::new(120, 100, 100)), Rgb::new(0, full, 0));
        assert_eq!(hsv_to_rgb(Hsv::new(240, 100, 100)), Rgb::new(0, 0, full));
        assert_eq!(hsv_to_rgb(Hsv::new(360, 100, 100)), Rgb::new(full, 0, 0));
    }

    #[test]
    fn hsv_without_saturation_is_grey() {
        let rgb = hsv_to_rgb(Hsv::new(200, 0, 50));
        assert_eq!(rgb.r, rgb.g);
        assert_eq!(rgb.g, rgb.b);
        assert_eq!(rgb.r, percent_to_full(50));
    }

    #[test]
    fn rgb_to_hsv_primaries() {
        let full = u16::MAX;
        assert_eq!(rgb_to_hsv(Rgb::new(full, 0, 0)), Hsv::new(0, 100, 100));
        assert_eq!(rgb_to_hsv(Rgb::new(0, full, 0)), Hsv::new(120, 100, 100));
        assert_eq!(rgb_to_hsv(Rgb::new(0, 0, full)), Hsv::new(240, 100, 100));
        assert_eq!(rgb_to_hsv(Rgb::BLACK), Hsv::new(0, 0, 0));
        assert_eq!(rgb_to_hsv(Rgb::new(full, full, full)), Hsv::new(0, 0, 100));
    }

    #[test]
    fn hsv_survives_conversion_closely() {
        for &hsv in &[Hsv::new(200, 80, 60), Hsv::new(30, 50, 90), Hsv::new(300, 100, 40)] {
            let back = rgb_to_hsv(hsv_to_rgb(hsv));
            assert!((back.h as i32 - hsv.h as i32).abs() <= 2, "{:?} -> {:?}", hsv, back);
            assert!((back.s as i32 - hsv.s as i32).abs() <= 1, "{:?} -> {:?}", hsv, back);
            assert!((back.v as i32 - hsv.v as i32).abs() <= 1, "{:?} -> {:?}", hsv, back);
        }
    }

    #[test]
    fn white_temperatures() {
        assert_eq!(white_to_rgb(6600), Rgb::new(u16::MAX, u16::MAX, u16::MAX));

        let warm = white_to_rgb(2000);
        assert_eq!(warm.r, u16::MAX);
        assert!(warm.r > warm.g && warm.g > warm.b);

        let cold = white_to_rgb(40_000);
        assert_eq!(cold.b, u16::MAX);
        assert!(cold.b > cold.r);

        assert_eq!(white_to_rgb(0), white_to_rgb(WHITE_TEMP_MIN));
        assert_eq!(white_to_rgb(u16::MAX), white_to_rgb(WHITE_TEMP_MAX));
    }

    #[test]
    fn rgb_scaling() {
        let rgb = Rgb::new(u16::MAX, 1000, 0).scaled(50);
        assert_eq!(rgb, Rgb::new(32767, 500, 0));
        assert_eq!(Rgb::new(10, 10, 10).scaled(200), Rgb::new(10, 10, 10));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Settings Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn factory_defaults() {
        let s = Settings::default();
        assert_eq!(s.version, SETTINGS_VERSION);
        assert_eq!(s.mode, ColorMode::Off);
        assert_eq!(s.intensity, 50);
        assert_eq!(s.color_temp, 6000);
        assert_eq!(s.rgb, [0, 0, 50]);
        assert_eq!(s.hsv, Hsv::new(0, 100, 50));
        assert_eq!(s.lcd_timeout_s, LCD_TIMEOUT_DEFAULT_SECS);
    }

    #[test]
    fn settings_layout_is_little_endian() {
        let settings = Settings {
            mode: ColorMode::Hsv,
            color_temp: 0x1234,
            ..Settings::default()
        };
        let mut buf = [0u8; SETTINGS_RECORD_SIZE];
        assert_eq!(settings.encode(&mut buf), SETTINGS_RECORD_SIZE);

        assert_eq!(buf[0], SETTINGS_VERSION);
        assert_eq!(buf[1], ColorMode::Hsv.tag());
        assert_eq!(&buf[2..4], &[50, 0]);
        assert_eq!(&buf[4..6], &[0x34, 0x12]);
        assert_eq!(&buf[24..26], &[LCD_TIMEOUT_DEFAULT_SECS as u8, 0]);
    }

    #[test]
    fn settings_decode_restores_fields() {
        let settings = Settings {
            mode: ColorMode::Rainbow,
            intensity: 77,
            rgb: [1, 2, 3],
            hsv: Hsv::new(359, 12, 34),
            rainbow_speed: 99,
            lcd_timeout_s: 240,
            ..Settings::default()
        };
        let mut buf = [0u8; 32];
        let len = settings.encode(&mut buf);

        assert_eq!(Settings::decode(&buf[..len]), Ok(settings));
        // Trailing bytes are ignored.
        assert_eq!(Settings::decode(&buf), Ok(settings));
    }

    #[test]
    fn settings_decode_rejects_foreign_records() {
        let mut buf = [0u8; SETTINGS_RECORD_SIZE];
        Settings::default().encode(&mut buf);

        assert_eq!(Settings::decode(&buf[..10]), Err(Error::SettingsCorrupt));

        let mut wrong_version = buf;
        wrong_version[0] = SETTINGS_VERSION + 1;
        assert_eq!(Settings::decode(&wrong_version), Err(Error::SettingsCorrupt));

        let mut bad_mode = buf;
        bad_mode[1] = 9;
        assert_eq!(Settings::decode(&bad_mode), Err(Error::SettingsCorrupt));
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        assert_eq!(Settings::decode_or_default(None), Settings::default());
        assert_eq!(
            Settings::decode_or_default(Some(&[0xFF; SETTINGS_RECORD_SIZE])),
            Settings::default()
        );
    }

    #[test]
    fn settings_encode_needs_room() {
        let mut small = [0u8; SETTINGS_RECORD_SIZE - 1];
        assert_eq!(Settings::default().encode(&mut small), 0);
    }

    // ════════════════════════════════════════════════════════════════════════
    // LCD Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn ddram_rows_interleave() {
        assert_eq!(ddram_address(0, 0), 0x00);
        assert_eq!(ddram_address(19, 0), 0x13);
        assert_eq!(ddram_address(0, 1), 0x40);
        assert_eq!(ddram_address(0, 2), 0x14);
        assert_eq!(ddram_address(5, 3), 0x59);
    }

    #[test]
    fn rom_codes_for_markers() {
        assert_eq!(rom_code('A'), b'A');
        assert_eq!(rom_code('→'), 0x7E);
        assert_eq!(rom_code('←'), 0x7F);
        assert_eq!(rom_code('°'), 0xDF);
        assert_eq!(rom_code('€'), 0xFF);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Application Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn strip_color_per_mode() {
        let mut settings = Settings::default();
        assert_eq!(strip_color(&settings, 0), Rgb::BLACK);

        settings.mode = ColorMode::Rgb;
        assert_eq!(strip_color(&settings, 0), Rgb::from_percent(0, 0, 50));

        settings.mode = ColorMode::Hsv;
        assert_eq!(strip_color(&settings, 0), hsv_to_rgb(Hsv::new(0, 100, 50)));

        settings.mode = ColorMode::White;
        assert_eq!(strip_color(&settings, 0), white_to_rgb(6000).scaled(50));

        settings.mode = ColorMode::Rainbow;
        assert_eq!(strip_color(&settings, 120), hsv_to_rgb(Hsv::new(120, 100, 50)));
    }

    #[test]
    fn idle_timeout_in_ticks() {
        assert_eq!(idle_timeout_ticks(0), 0);
        assert_eq!(idle_timeout_ticks(10), 10 * TICKS_PER_SECOND);
        assert_eq!(
            idle_timeout_ticks(LCD_TIMEOUT_MAX_SECS),
            LCD_TIMEOUT_MAX_SECS * TICKS_PER_SECOND
        );
    }

    #[test]
    fn start_lights_strip_and_fades_in() {
        let shared = SharedState::new();
        let settings = Settings { mode: ColorMode::Rgb, ..Settings::default() };
        let mut controller = Controller::new(settings);

        controller.start(&shared, &mut NullLcd);

        assert!(shared.semaphore.contains(Flags::FADE_IN));
        assert!(shared.semaphore.contains(Flags::PWM_RGB_PENDING));
        assert_eq!(
            shared.staged_duty(Channel::Blue),
            brightness_to_pwm(percent_to_full(50))
        );
        assert_eq!(
            shared.timeouts.get(TimeoutId::LcdBacklight).remaining(),
            idle_timeout_ticks(LCD_TIMEOUT_DEFAULT_SECS)
        );
    }

    #[test]
    fn idle_timeout_fades_backlight_out() {
        let shared = SharedState::new();
        let mut controller = Controller::new(Settings::default());
        controller.start(&shared, &mut NullLcd);
        while controller.backlight() < u16::MAX {
            controller.service(&shared, &mut NullLcd);
        }

        shared.timeouts.arm(TimeoutId::LcdBacklight, 1);
        shared.timeouts.tick();
        controller.service(&shared, &mut NullLcd);

        assert!(shared.semaphore.contains(Flags::FADE_OUT));
        assert!(controller.backlight() < u16::MAX);
    }

    #[test]
    fn input_fades_backlight_back_in() {
        let shared = SharedState::new();
        let mut controller = Controller::new(Settings::default());
        controller.start(&shared, &mut NullLcd);
        shared.semaphore.clear(Flags::FADE_IN);
        FadeSequencer::new().start_fade_out(&shared.semaphore);

        shared.publish_rotation(1);
        controller.service(&shared, &mut NullLcd);

        assert!(!shared.semaphore.contains(Flags::FADE_OUT));
        assert_eq!(controller.menu().selected(), 1);
    }

    #[test]
    fn rainbow_keeps_flag_and_moves_hue() {
        let shared = SharedState::new();
        let settings = Settings {
            mode: ColorMode::Rainbow,
            rainbow_speed: 100,
            ..Settings::default()
        };
        let mut controller = Controller::new(settings);
        controller.start(&shared, &mut NullLcd);
        assert!(shared.semaphore.contains(Flags::RAINBOW));

        for _ in 0..TICKS_PER_SECOND / 2 {
            controller.service(&shared, &mut NullLcd);
        }
        assert!(controller.rainbow_hue() > 90);
        assert!(shared.semaphore.contains(Flags::RAINBOW));
    }

    #[test]
    fn switching_off_clears_rainbow() {
        let shared = SharedState::new();
        let settings = Settings { mode: ColorMode::Rainbow, ..Settings::default() };
        let mut controller = Controller::new(settings);
        controller.start(&shared, &mut NullLcd);

        // Root entry 0 is "Off".
        shared.publish_buttons(ButtonHistory::from_bits(ButtonHistory::ENCODER_NEW));
        controller.service(&shared, &mut NullLcd);

        assert_eq!(controller.lights().mode(), ColorMode::Off);
        assert!(!shared.semaphore.contains(Flags::RAINBOW));
        for channel in Channel::RGB {
            assert_eq!(shared.staged_duty(channel), 0);
        }
    }
}
