//! Per-memory random number generator.
//!
//! Noise sampling and tie-breaking both draw from a single seeded generator
//! so that a memory's trace is fully reproducible; nothing in this crate
//! falls back to a thread-local or global RNG.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded generator threading through noise sampling and tie-breaking.
pub struct MemoryRng {
	rng: ChaCha8Rng,
}

impl MemoryRng {
	/// Build a generator from an explicit seed.
	#[must_use]
	pub fn from_seed(seed: u64) -> Self {
		Self {
			rng: ChaCha8Rng::seed_from_u64(seed),
		}
	}

	/// Build a generator seeded from OS entropy.
	#[must_use]
	pub fn from_entropy() -> Self {
		Self {
			rng: ChaCha8Rng::from_entropy(),
		}
	}

	/// Sample `Logistic(0, sigma)` noise via inverse-CDF sampling. Returns
	/// `0.0` when `sigma == 0`.
	pub fn logistic_noise(&mut self, sigma: f64) -> f64 {
		if sigma == 0.0 {
			return 0.0;
		}
		// u is drawn from the open interval (0, 1) to avoid ln(0) / ln(inf).
		let u: f64 = self.rng.gen_range(f64::EPSILON..1.0 - f64::EPSILON);
		sigma * (u / (1.0 - u)).ln()
	}

	/// Pick a uniformly random index in `[0, len)`. Used to break activation
	/// ties and to pick among equally-blended choices.
	pub fn choose_index(&mut self, len: usize) -> usize {
		self.rng.gen_range(0..len)
	}
}
