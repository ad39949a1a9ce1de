//! Boot-time seed for expression selection
//!
//! The RP2040 has no hardware RNG. The least significant bits of the
//! on-chip temperature sensor reading are noisy enough to make the random
//! sequence differ between boots once mixed with the boot tick count.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::Instant;

use emotive_core::traits::SeededRandom;

/// Number of ADC samples folded into the seed
const SAMPLES: usize = 32;

/// Gather a seed from temperature sensor noise and the boot time
pub async fn boot_seed(adc: &mut Adc<'_, Async>, sensor: &mut Channel<'_>) -> u64 {
    let mut noise = 0u64;
    let mut failures = 0u32;

    for i in 0..SAMPLES {
        match adc.read(sensor).await {
            // Two noisy low bits per sample
            Ok(sample) => noise ^= ((sample & 0x3) as u64) << ((i * 2) % 64),
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        warn!("{} of {} ADC samples failed", failures, SAMPLES);
    }

    SeededRandom::mix_seed(&[noise, Instant::now().as_ticks()])
}
