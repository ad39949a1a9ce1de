//! Skip button task
//!
//! Short press: stop the current expression at the next frame boundary,
//! or end the pause if nothing is playing.
//! Long press: toggle between random and sequential selection.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use emotive_core::config::SelectionMode;

use crate::channels::{ABORT, MODE_CHANGE, SKIP};

/// Debounce interval after an edge
const DEBOUNCE_MS: u64 = 20;

/// Presses shorter than this are treated as bounce
const MIN_PRESS_MS: u64 = 50;

/// Hold time that counts as a long press
const LONG_PRESS_MS: u64 = 800;

/// Button press task
///
/// The button pulls the pin low (internal pull-up).
#[embassy_executor::task]
pub async fn button_task(mut btn: Input<'static>, initial_mode: SelectionMode) {
    info!("Button task started");

    let mut mode = initial_mode;

    loop {
        btn.wait_for_falling_edge().await;
        let press_start = Instant::now();

        // Debounce
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if !btn.is_low() {
            continue;
        }

        // Wait for release or long press timeout
        match with_timeout(Duration::from_millis(LONG_PRESS_MS), btn.wait_for_rising_edge()).await {
            Ok(()) => {
                if press_start.elapsed().as_millis() >= MIN_PRESS_MS {
                    debug!("Button: skip");
                    ABORT.raise();
                    SKIP.signal(());
                }
            }
            Err(_) => {
                mode = mode.toggled();
                info!("Button: selection mode {}", mode);
                MODE_CHANGE.signal(mode);
                // Wait for actual release
                btn.wait_for_rising_edge().await;
            }
        }

        // Debounce after release
        Timer::after(Duration::from_millis(MIN_PRESS_MS)).await;
    }
}
