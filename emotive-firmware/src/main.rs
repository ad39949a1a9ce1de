//! Emotive - Companion Expression Firmware
//!
//! Plays delta-encoded animations on a 128x64 SSD1306 OLED from an
//! RP2040 board. Which expressions exist, how fast they play and how the
//! next one is chosen all come from companion.toml, checked at build time.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c, InterruptHandler as I2cInterruptHandler};
use embassy_rp::peripherals::I2C0;
use {defmt_rtt as _, panic_probe as _};

use emotive_core::traits::SeededRandom;
use emotive_core::PlaybackDriver;
use emotive_display::{PanelConfig, Ssd1306};

use portable_atomic::Ordering;

use crate::channels::PANEL_FAULT;
use crate::clock::EmbassyClock;
use crate::config::{build_catalog, load_config};
use crate::tasks::PlaybackSettings;

mod assets;
mod channels;
mod clock;
mod config;
mod entropy;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => I2cInterruptHandler<I2C0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

/// OLED bus speed
const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Emotive firmware starting...");

    let p = embassy_rp::init(Default::default());

    let config = load_config();

    // Seed selection from temperature sensor noise
    let mut adc = Adc::new(p.ADC, Irqs, embassy_rp::adc::Config::default());
    let mut sensor = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
    let seed = entropy::boot_seed(&mut adc, &mut sensor).await;
    debug!("Selection seed {=u64:x}", seed);

    // OLED on I2C0 (GP4=SDA, GP5=SCL)
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_async(p.I2C0, p.PIN_5, p.PIN_4, Irqs, i2c_config);

    let panel = PanelConfig {
        address: config.display.address,
        contrast: config.display.contrast,
        flip: config.display.flip,
    };
    let mut display = Ssd1306::new(i2c, panel);
    match display.init().await {
        Ok(()) => info!("OLED initialized at {=u8:#x}", config.display.address),
        // Playback keeps retrying the panel after transport errors
        Err(e) => {
            error!("Failed to initialize display: {:?}", e);
            PANEL_FAULT.store(true, Ordering::Relaxed);
        }
    }

    let catalog = build_catalog(&config, SeededRandom::from_seed(seed));

    let mut driver = PlaybackDriver::new(display, EmbassyClock);
    driver.set_default_delay(config.playback.default_delay_ms);

    let settings = PlaybackSettings {
        selection: config.playback.selection,
        pause_ms: config.playback.pause_ms,
        startup: config.playback.startup.clone(),
    };

    // Status LED and skip button (active low)
    let led = Output::new(p.PIN_25, Level::Low);
    let button = Input::new(p.PIN_15, Pull::Up);

    // Spawn tasks
    spawner
        .spawn(tasks::heartbeat_task(led, config.status.clone()))
        .unwrap();
    spawner
        .spawn(tasks::button_task(button, config.playback.selection))
        .unwrap();
    spawner
        .spawn(tasks::playback_task(driver, catalog, settings))
        .unwrap();

    info!("All tasks spawned");
}
