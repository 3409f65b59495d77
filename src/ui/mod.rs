//! The product menu: what the user can reach with the encoder.
//!
//! ```text
//! Off
//! White    > Brightness %, Color temp K
//! RGB      > Red %, Green %, Blue %
//! HSV      > Hue °, Saturation %, Value %
//! Rainbow  > Speed %, Saturation %, Brightness %
//! Setup    > LCD timeout s, Save, Version
//! ```
//!
//! Editing any value switches the strip to the mode of its submenu.

use crate::app::Lights;
use crate::menu::stock::{adjust_circle, adjust_color_temp, adjust_percent, adjust_seconds};
use crate::menu::MenuEntry;
use crate::settings::ColorMode;

/// Firmware version shown in the setup menu.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub static MAIN_MENU: [MenuEntry<Lights>; 6] = [
    MenuEntry::Simple { label: "Off", action: switch_off },
    MenuEntry::Submenu { label: "White", entries: &WHITE_MENU },
    MenuEntry::Submenu { label: "RGB", entries: &RGB_MENU },
    MenuEntry::Submenu { label: "HSV", entries: &HSV_MENU },
    MenuEntry::Submenu { label: "Rainbow", entries: &RAINBOW_MENU },
    MenuEntry::Submenu { label: "Setup", entries: &SETUP_MENU },
];

static WHITE_MENU: [MenuEntry<Lights>; 3] = [
    MenuEntry::Number {
        label: "Brightness",
        unit: '%',
        value: white_intensity,
        changed: white_changed,
    },
    MenuEntry::Number {
        label: "Color temp",
        unit: 'K',
        value: white_temperature,
        changed: white_changed,
    },
    MenuEntry::Return { label: "Back" },
];

static RGB_MENU: [MenuEntry<Lights>; 4] = [
    MenuEntry::Number { label: "Red", unit: '%', value: red, changed: rgb_changed },
    MenuEntry::Number { label: "Green", unit: '%', value: green, changed: rgb_changed },
    MenuEntry::Number { label: "Blue", unit: '%', value: blue, changed: rgb_changed },
    MenuEntry::Return { label: "Back" },
];

static HSV_MENU: [MenuEntry<Lights>; 4] = [
    MenuEntry::Number { label: "Hue", unit: '°', value: hue, changed: hsv_changed },
    MenuEntry::Number {
        label: "Saturation",
        unit: '%',
        value: saturation,
        changed: hsv_changed,
    },
    MenuEntry::Number { label: "Value", unit: '%', value: hsv_value, changed: hsv_changed },
    MenuEntry::Return { label: "Back" },
];

static RAINBOW_MENU: [MenuEntry<Lights>; 4] = [
    MenuEntry::Number {
        label: "Speed",
        unit: '%',
        value: rainbow_speed,
        changed: rainbow_changed,
    },
    MenuEntry::Number {
        label: "Saturation",
        unit: '%',
        value: rainbow_saturation,
        changed: rainbow_changed,
    },
    MenuEntry::Number {
        label: "Brightness",
        unit: '%',
        value: rainbow_value,
        changed: rainbow_changed,
    },
    MenuEntry::Return { label: "Back" },
];

static SETUP_MENU: [MenuEntry<Lights>; 4] = [
    MenuEntry::Number {
        label: "LCD timeout",
        unit: 's',
        value: lcd_timeout,
        changed: lcd_timeout_changed,
    },
    MenuEntry::Simple { label: "Save", action: save },
    MenuEntry::Text { label: "Version", text: VERSION },
    MenuEntry::Return { label: "Back" },
];

// Actions

fn switch_off(lights: &mut Lights) {
    lights.select(ColorMode::Off);
}

fn save(lights: &mut Lights) {
    lights.request_save();
}

// White

fn white_intensity(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.intensity, delta)
}

fn white_temperature(lights: &mut Lights, delta: i8) -> i32 {
    adjust_color_temp(&mut lights.settings.color_temp, delta)
}

fn white_changed(lights: &mut Lights) {
    lights.select(ColorMode::White);
}

// RGB

fn red(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rgb[0], delta)
}

fn green(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rgb[1], delta)
}

fn blue(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rgb[2], delta)
}

fn rgb_changed(lights: &mut Lights) {
    lights.select(ColorMode::Rgb);
}

// HSV

fn hue(lights: &mut Lights, delta: i8) -> i32 {
    adjust_circle(&mut lights.settings.hsv.h, delta)
}

fn saturation(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.hsv.s, delta)
}

fn hsv_value(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.hsv.v, delta)
}

fn hsv_changed(lights: &mut Lights) {
    lights.select(ColorMode::Hsv);
}

// Rainbow

fn rainbow_speed(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rainbow_speed, delta)
}

fn rainbow_saturation(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rainbow_saturation, delta)
}

fn rainbow_value(lights: &mut Lights, delta: i8) -> i32 {
    adjust_percent(&mut lights.settings.rainbow_value, delta)
}

fn rainbow_changed(lights: &mut Lights) {
    lights.select(ColorMode::Rainbow);
}

// Setup

fn lcd_timeout(lights: &mut Lights, delta: i8) -> i32 {
    adjust_seconds(&mut lights.settings.lcd_timeout_s, delta)
}

// The idle timeout is re-armed with the new value once the input that
// changed it has been handled.
fn lcd_timeout_changed(_: &mut Lights) {}
