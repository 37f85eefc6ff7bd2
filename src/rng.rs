//! Deterministic pseudo-random source for the random chooser.
//!
//! Hand-rolled on purpose: with a fixed seed the sequence of choices must be
//! identical across builds, so no dependency whose algorithm could shift
//! under a version bump is acceptable here. Not cryptographically secure.

use std::time::{SystemTime, UNIX_EPOCH};

const SEED_SCRAMBLE: u64 = 0x9e37_79b9_7f4a_7c15;

/// xorshift64* generator.
#[derive(Debug, Clone)]
pub(crate) struct Rng {
    state: u64,
}

impl Rng {
    /// Creates a generator from an explicit seed. Zero is remapped so the
    /// generator never degenerates to a constant stream.
    pub(crate) const fn seeded(seed: u64) -> Self {
        Self {
            state: if seed == 0 { SEED_SCRAMBLE } else { seed },
        }
    }

    /// Creates a generator seeded from wall clock and process identity.
    pub(crate) fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(SEED_SCRAMBLE);
        Self::seeded(nanos ^ (u64::from(std::process::id()) << 32))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    /// Uniform index in `[0, bound)`, rejection-sampled to avoid modulo bias.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    pub(crate) fn pick(&mut self, bound: usize) -> usize {
        assert!(bound > 0, "bound must be non-zero");
        let bound = bound as u64;
        let threshold = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < threshold {
                return (value % bound) as usize;
            }
        }
    }
}
