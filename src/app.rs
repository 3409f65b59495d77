//! Main-loop side of the firmware.
//!
//! [`Controller::service`] is one pass of the main loop after a wake:
//!
//! 1. take the rotation step and latched button presses
//! 2. dispatch them to the menu (encoder push = Press, aux button = Back)
//! 3. on any input, re-arm the idle timeout and fade the backlight in
//! 4. on idle timeout, fade the backlight out
//! 5. step the backlight fade and the rainbow animation
//! 6. restage the strip duty if anything changed it
//!
//! Nothing here blocks or fails; the only thing handed back to the caller
//! is a settings snapshot when the user asked to save.

use crate::color::{brightness_to_pwm, hsv_to_rgb, white_to_rgb, Hsv, Rgb};
use crate::config::{RAINBOW_HUE_STEP_PER_PERCENT, TICKS_PER_SECOND};
use crate::fade::FadeSequencer;
use crate::input::ButtonHistory;
use crate::lcd::TextSink;
use crate::menu::{Menu, MenuEvent};
use crate::settings::{ColorMode, Settings};
use crate::shared::{Flags, SharedState};
use crate::timeout::TimeoutId;
use crate::ui;

/// Rainbow hue accumulator range (degrees in 1/256 steps).
const RAINBOW_PHASE_WRAP: u32 = 360 * 256;

/// Menu context: the working settings copy and what the menu asked for.
#[derive(Clone, Debug)]
pub struct Lights {
    pub settings: Settings,
    output_dirty: bool,
    save_requested: bool,
}

impl Lights {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            output_dirty: true,
            save_requested: false,
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.settings.mode
    }

    /// Switch the strip to `mode` and have its outputs recomputed.
    pub fn select(&mut self, mode: ColorMode) {
        if self.settings.mode != mode {
            info!("Mode: {:?}", mode);
        }
        self.settings.mode = mode;
        self.output_dirty = true;
    }

    pub fn request_save(&mut self) {
        info!("Settings: save requested");
        self.save_requested = true;
    }

    pub fn take_output_dirty(&mut self) -> bool {
        core::mem::take(&mut self.output_dirty)
    }

    pub fn take_save_request(&mut self) -> bool {
        core::mem::take(&mut self.save_requested)
    }
}

/// Strip color for `settings`. `rainbow_hue` is only used in rainbow mode.
pub fn strip_color(settings: &Settings, rainbow_hue: u16) -> Rgb {
    match settings.mode {
        ColorMode::Off => Rgb::BLACK,
        ColorMode::White => white_to_rgb(settings.color_temp).scaled(settings.intensity),
        ColorMode::Rgb => Rgb::from_percent(settings.rgb[0], settings.rgb[1], settings.rgb[2]),
        ColorMode::Hsv => hsv_to_rgb(settings.hsv),
        ColorMode::Rainbow => hsv_to_rgb(Hsv::new(
            rainbow_hue,
            settings.rainbow_saturation,
            settings.rainbow_value,
        )),
    }
}

/// Idle timeout in ticks; 0 disables it.
pub fn idle_timeout_ticks(seconds: u16) -> u16 {
    seconds.saturating_mul(TICKS_PER_SECOND)
}

/// Everything the main loop owns.
pub struct Controller {
    lights: Lights,
    menu: Menu<Lights>,
    fade: FadeSequencer,
    rainbow_phase: u32,
}

impl Controller {
    pub fn new(settings: Settings) -> Self {
        Self {
            lights: Lights::new(settings),
            menu: Menu::new(&ui::MAIN_MENU),
            fade: FadeSequencer::new(),
            rainbow_phase: 0,
        }
    }

    pub fn lights(&self) -> &Lights {
        &self.lights
    }

    pub fn menu(&self) -> &Menu<Lights> {
        &self.menu
    }

    pub fn backlight(&self) -> u16 {
        self.fade.brightness()
    }

    /// Current rainbow hue in degrees.
    pub fn rainbow_hue(&self) -> u16 {
        (self.rainbow_phase / 256) as u16
    }

    /// Draw the menu, light the strip and fade the backlight in.
    pub fn start(&mut self, shared: &SharedState, lcd: &mut impl TextSink) {
        info!("App: starting in {:?}", self.lights.mode());
        lcd.clear();
        self.menu.redraw(&mut self.lights, lcd);
        self.wake_display(shared);
        self.update_outputs(shared);
    }

    /// One main-loop pass. Returns the settings to persist if the user
    /// asked to save.
    pub fn service(&mut self, shared: &SharedState, lcd: &mut impl TextSink) -> Option<Settings> {
        let step = shared.take_rotation();
        let presses = shared.take_button_presses();

        if presses & ButtonHistory::ENCODER_NEW != 0 {
            self.menu.dispatch(&mut self.lights, lcd, MenuEvent::Press);
        }
        if presses & ButtonHistory::BACK_NEW != 0 {
            self.menu.dispatch(&mut self.lights, lcd, MenuEvent::Back);
        }
        if step != 0 {
            self.menu.dispatch(&mut self.lights, lcd, MenuEvent::Rotate(step));
        }
        if step != 0 || presses != 0 {
            self.wake_display(shared);
        }

        if shared.timeouts.consume(TimeoutId::LcdBacklight) {
            debug!("App: idle, backlight off");
            self.fade.start_fade_out(&shared.semaphore);
        }
        self.fade.step(shared);

        if shared.semaphore.contains(Flags::RAINBOW) {
            self.advance_rainbow();
        }
        if self.lights.take_output_dirty() {
            self.update_outputs(shared);
        }

        self.lights.take_save_request().then_some(self.lights.settings)
    }

    fn wake_display(&mut self, shared: &SharedState) {
        let ticks = idle_timeout_ticks(self.lights.settings.lcd_timeout_s);
        shared.timeouts.arm(TimeoutId::LcdBacklight, ticks);
        if self.fade.brightness() < u16::MAX {
            self.fade.start_fade_in(&shared.semaphore);
        }
    }

    fn advance_rainbow(&mut self) {
        let step = self.lights.settings.rainbow_speed.min(100) as u32 * RAINBOW_HUE_STEP_PER_PERCENT;
        self.rainbow_phase = (self.rainbow_phase + step) % RAINBOW_PHASE_WRAP;
        self.lights.output_dirty = true;
    }

    /// Stage the strip duty and keep the rainbow flag in line with the mode.
    fn update_outputs(&mut self, shared: &SharedState) {
        let color = strip_color(&self.lights.settings, self.rainbow_hue());
        shared.stage_strip(color.channels().map(brightness_to_pwm));

        if self.lights.mode() == ColorMode::Rainbow {
            shared.semaphore.set(Flags::RAINBOW);
        } else {
            shared.semaphore.clear(Flags::RAINBOW);
        }
    }
}
