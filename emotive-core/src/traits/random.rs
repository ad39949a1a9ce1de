//! Randomness for expression selection

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform integer source
pub trait RandomSource {
    /// Uniform value in `[0, n)`. Returns 0 when `n` is 0.
    fn below(&mut self, n: usize) -> usize;
}

/// Small PRNG that must be seeded explicitly
///
/// There is deliberately no `Default`: an unseeded generator repeats the
/// same expression sequence after every reset.
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    /// Create from a 64-bit seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Fold several weak entropy readings (ADC noise, boot ticks) into one
    /// seed using the splitmix64 finaliser
    pub fn mix_seed(parts: &[u64]) -> u64 {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        for &part in parts {
            state ^= part;
            state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            state = z ^ (z >> 31);
        }
        state
    }
}

impl RandomSource for SeededRandom {
    fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }
}
