//! Embassy time source for frame pacing

use embassy_time::{Instant, Timer};

use emotive_core::traits::Clock;

/// Clock backed by the embassy time driver
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn wait_ms(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await;
    }
}
