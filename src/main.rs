//! blinkenlights - RGB LED strip controller firmware for nRF52840.
//!
//! TIMER1 fires every 4.096 ms. Its handler samples the rotary encoder and
//! buttons, counts down timeouts and commits PWM values, then wakes the
//! main loop only if something needs attention. The main loop runs the
//! menu and the fades and goes back to sleep in the executor.

#![no_std]
#![no_main]

mod board;
mod storage;

use core::cell::RefCell;

use blinkenlights::app::Controller;
use blinkenlights::lcd::Hd44780;
use blinkenlights::shared::SharedState;
use blinkenlights::tick::TickHandler;
use blinkenlights::ui::VERSION;
use critical_section::Mutex;
use defmt::{info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::interrupt;
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::pwm::SimplePwm;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use crate::board::{Inputs, NrfPwm};
use crate::storage::SettingsStore;

/// Everything the tick interrupt owns once the main loop has handed it over.
struct TickContext {
    handler: TickHandler,
    pwm: NrfPwm,
    inputs: Inputs,
}

static SHARED: SharedState = SharedState::new();

/// Raised by the tick handler; coalesces so a slow pass is woken once.
static WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

static TICK: Mutex<RefCell<Option<TickContext>>> = Mutex::new(RefCell::new(None));

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    info!("blinkenlights v{} starting", VERSION);

    let mut store = SettingsStore::new(BlockingAsync::new(Nvmc::new(p.NVMC)));
    let settings = store.load().await;

    let mut lcd = Hd44780::new(
        Output::new(p.P0_30, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_31, Level::Low, OutputDrive::Standard),
        [
            Output::new(p.P1_10, Level::Low, OutputDrive::Standard),
            Output::new(p.P1_11, Level::Low, OutputDrive::Standard),
            Output::new(p.P1_12, Level::Low, OutputDrive::Standard),
            Output::new(p.P1_13, Level::Low, OutputDrive::Standard),
        ],
        Delay,
    );
    if let Err(e) = lcd.init() {
        warn!("LCD init failed: {:?}", e);
    }

    let pwm = NrfPwm::new(SimplePwm::new_4ch(p.PWM0, p.P0_13, p.P0_14, p.P0_15, p.P0_16));
    let inputs = Inputs {
        encoder_a: Input::new(p.P0_03, Pull::Up),
        encoder_b: Input::new(p.P0_04, Pull::Up),
        encoder_push: Input::new(p.P0_28, Pull::Up),
        back: Input::new(p.P0_29, Pull::Up),
    };

    critical_section::with(|cs| {
        TICK.borrow_ref_mut(cs).replace(TickContext {
            handler: TickHandler::new(),
            pwm,
            inputs,
        });
    });

    let mut controller = Controller::new(settings);
    controller.start(&SHARED, &mut lcd);
    board::start_tick_timer(p.TIMER1);
    info!("Tick running, entering main loop");

    loop {
        WAKE.wait().await;
        if let Some(settings) = controller.service(&SHARED, &mut lcd) {
            if let Err(e) = store.save(&settings).await {
                warn!("Settings not saved: {:?}", e);
            }
        }
    }
}

#[interrupt]
fn TIMER1() {
    board::clear_tick_event();
    // Uncontended: only this handler touches TICK after start-up.
    critical_section::with(|cs| {
        if let Some(ctx) = TICK.borrow_ref_mut(cs).as_mut() {
            let sample = ctx.inputs.sample();
            if ctx.handler.on_tick(&SHARED, &mut ctx.pwm, sample) {
                WAKE.signal(());
            }
        }
    });
}
