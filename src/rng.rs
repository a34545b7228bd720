//! Deterministic random number generation
//!
//! The whole simulation draws from one seeded ChaCha stream so that a run is
//! reproducible from its seed and the order of draws.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Explicit generator handle threaded through the engine and every agent call.
#[derive(Clone, Debug)]
pub struct SimRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Restart the stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(42)
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Helper draws shared by the behavior code.
pub trait RngExt {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;
    /// True when a `[0, 1)` draw lands at or below `probability`.
    fn chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng + ?Sized> RngExt for R {
    fn unit(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.unit() <= probability
    }
}
