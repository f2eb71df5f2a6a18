//! Threshold sources for admission decisions

use rand::Rng;
use rand_pcg::Pcg32;
use std::sync::Mutex;

/// Increment used for the PCG stream; any odd constant works.
const PCG_STREAM: u64 = 0xa02b_dbf7_bb3c_0a7;

/// Source of the random threshold drawn for every sampled record.
pub trait Threshold: Send + Sync {
    /// Returns a pseudo-random threshold in `[0.0, 1.0)`.
    fn draw(&self) -> f64;
}

/// PCG32-backed threshold source, seeded once at construction.
///
/// The generator sits behind a mutex so concurrent callers each advance the
/// sequence and never observe the same draw.
#[derive(Debug)]
pub struct RandomThreshold {
    seed: u64,
    rng: Mutex<Pcg32>,
}

impl RandomThreshold {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(Pcg32::new(seed, PCG_STREAM)),
        }
    }

    /// Seed from the wall clock in nanoseconds.
    pub fn from_clock() -> Self {
        Self::new(dropsample_shared::utils::time::system_time_nanos())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Threshold for RandomThreshold {
    fn draw(&self) -> f64 {
        // Generator state stays valid across a poisoning panic.
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen::<f64>()
    }
}

/// Threshold source that always returns the same value. Useful for
/// replaying a decision stream deterministically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedThreshold(pub f64);

impl Threshold for FixedThreshold {
    fn draw(&self) -> f64 {
        self.0
    }
}
