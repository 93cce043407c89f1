//! Deterministic random number generation for chance conditions.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical rolls
//! - **Portable**: ChaCha8 output does not depend on platform
//!
//! ```
//! use battle_lab::core::BattleRng;
//!
//! let mut a = BattleRng::new(42);
//! let mut b = BattleRng::new(42);
//!
//! for _ in 0..10 {
//!     assert_eq!(a.gen_bool(0.3), b.gen_bool(0.3));
//! }
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG backing `CHANCE` conditions.
///
/// Uses ChaCha8 for speed while keeping a reproducible, seedable stream.
#[derive(Clone, Debug)]
pub struct BattleRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl BattleRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Roll `true` with the given probability.
    ///
    /// Probabilities outside `[0, 1]` are clamped; callers validate first.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Seed this stream started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
