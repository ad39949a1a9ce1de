//! Status LED heartbeat
//!
//! Toggles the on-board LED so a frozen executor is visible even when the
//! panel is dark. Blinks fast while the panel is not responding.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::Timer;
use portable_atomic::Ordering;

use emotive_core::config::StatusConfig;

use crate::channels::PANEL_FAULT;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: Output<'static>, status: StatusConfig) {
    info!(
        "Heartbeat task started ({} ms, {} ms on panel fault)",
        status.heartbeat_ms, status.fault_heartbeat_ms
    );

    loop {
        led.toggle();
        let fault = PANEL_FAULT.load(Ordering::Relaxed);
        Timer::after_millis(status.period_ms(fault) as u64).await;
    }
}
