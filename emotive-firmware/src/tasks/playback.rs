//! Expression playback task
//!
//! Owns the playback driver (and with it the only framebuffer and the
//! panel) plus the catalog. Picks an expression, plays it, pauses, and
//! repeats forever.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_time::Timer;
use heapless::String;
use portable_atomic::Ordering;

use emotive_core::catalog::{Catalog, SelectionPolicy};
use emotive_core::config::{SelectionMode, MAX_NAME_LEN};
use emotive_core::traits::SeededRandom;
use emotive_core::{PlaybackDriver, PlaybackError};
use emotive_display::{Ssd1306, FRAME_BYTES};

use crate::channels::{ABORT, MODE_CHANGE, PANEL_FAULT, SKIP};
use crate::clock::EmbassyClock;

/// Panel on I2C0
pub type Display = Ssd1306<I2c<'static, I2C0, i2c::Async>>;

/// Playback driver with a full-panel framebuffer
pub type Driver = PlaybackDriver<Display, EmbassyClock, FRAME_BYTES>;

/// Wait before re-initialising the panel after a bus error
const RECOVERY_DELAY_MS: u64 = 250;

/// Wait before retrying when nothing can be selected
const IDLE_RETRY_MS: u64 = 1_000;

/// Playback settings from the config
pub struct PlaybackSettings {
    pub selection: SelectionMode,
    pub pause_ms: u32,
    pub startup: Option<String<MAX_NAME_LEN>>,
}

/// Playback task
#[embassy_executor::task]
pub async fn playback_task(
    mut driver: Driver,
    mut catalog: Catalog<'static, SeededRandom>,
    settings: PlaybackSettings,
) {
    info!("Playback task started with {} expressions", catalog.count());

    let mut mode = settings.selection;
    let mut startup = settings.startup;

    loop {
        if let Some(new_mode) = MODE_CHANGE.try_take() {
            mode = new_mode;
            info!("Selection mode {}", mode);
        }

        let policy = match startup.as_deref() {
            Some(name) => SelectionPolicy::ByName(name),
            None => SelectionPolicy::from(mode),
        };
        let selected = catalog.select(policy).map(|(index, entry)| (index, *entry));
        startup = None;

        let (index, entry) = match selected {
            Ok(selection) => selection,
            Err(e) => {
                warn!("Nothing to play: {:?}", e);
                Timer::after_millis(IDLE_RETRY_MS).await;
                continue;
            }
        };

        ABORT.clear();
        debug!("Playing {} (#{})", entry.name, index);

        match driver.play(&entry.store, &ABORT).await {
            Ok(report) => {
                PANEL_FAULT.store(false, Ordering::Relaxed);
                debug!(
                    "{}: {} frames in {} ms ({})",
                    entry.name, report.frames_pushed, report.elapsed_ms, report.outcome
                );
            }
            Err(PlaybackError::DisplayTransport(e)) => {
                error!("Display error during {}: {:?}", entry.name, e);
                PANEL_FAULT.store(true, Ordering::Relaxed);
                Timer::after_millis(RECOVERY_DELAY_MS).await;
                match driver.sink_mut().init().await {
                    Ok(()) => info!("Display reinitialized"),
                    Err(e) => error!("Display reinit failed: {:?}", e),
                }
            }
            Err(PlaybackError::Frame(e)) => {
                error!("Bad frame data in {}: {:?}", entry.name, e);
            }
        }

        // Pause between expressions; a press or a mode change ends it early.
        // A press that aborted the expression above does not also skip the
        // pause.
        SKIP.reset();
        let pause = Timer::after_millis(settings.pause_ms as u64);
        match select3(pause, MODE_CHANGE.wait(), SKIP.wait()).await {
            Either3::First(()) => {}
            Either3::Second(new_mode) => {
                mode = new_mode;
                info!("Selection mode {}", mode);
            }
            Either3::Third(()) => debug!("Pause skipped"),
        }
    }
}
