//! Activation calculation.
//!
//! For chunk *i*, activation `A_i = B_i + ε_i + P_i`:
//!
//! 1. **Base-level activation** `B_i` — recency/frequency from the
//!    reinforcement history: `B_i = ln Σ_j (t - t_ij)^(-d)`.
//! 2. **Noise** `ε_i` — a `Logistic(0, σ)` sample.
//! 3. **Partial match** `P_i` — `μ · Σ_k ω_k (S_ik - 1)` over probe
//!    attributes with a registered similarity function.

use crate::chunk::AttributeMap;
use crate::error::Result;
use crate::similarity::SimilarityRegistry;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// How base-level activation is computed from reinforcement history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizedLearning {
	/// Use the full reinforcement history (`Σ_j (t-t_ij)^(-d)`).
	Off,
	/// Approximate using only the first-occurrence time and count.
	On,
	/// Use the `k` most recent timestamps exactly; approximate the rest as
	/// if uniformly distributed.
	Fixed(NonZeroUsize),
}

/// Policy for handling a reinforcement at exactly `current_time` (age zero),
/// which makes `age^(-d)` singular for `d > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ZeroAgePolicy {
	/// Omit zero-age reinforcements from the base-level sum.
	Skip,
	/// Treat a zero-age reinforcement as having this (small positive) age.
	EpsilonFloor(f64),
}

impl Default for ZeroAgePolicy {
	/// Chosen default: an epsilon floor rather than skipping. Skipping can
	/// make a chunk's base level undefined (`ln(0)`) when every reinforcement
	/// happens to land at `current_time`, which is a more surprising failure
	/// mode than a deterministic, very-large-but-finite activation.
	fn default() -> Self {
		ZeroAgePolicy::EpsilonFloor(1e-10)
	}
}

/// Base-level activation from a chunk's reinforcement history.
///
/// Reinforcement timestamps must be sorted non-decreasingly (a chunk store
/// invariant). Returns `0.0` if `decay` is `None` (decay disabled).
#[must_use]
pub fn base_level_activation(
	reinforcements: &[f64],
	current_time: f64,
	decay: Option<f64>,
	mode: OptimizedLearning,
	zero_age: ZeroAgePolicy,
) -> f64 {
	let Some(d) = decay else {
		return 0.0;
	};
	if reinforcements.is_empty() {
		return f64::NEG_INFINITY;
	}

	match mode {
		OptimizedLearning::Off => base_level_exact(reinforcements, current_time, d, zero_age),
		OptimizedLearning::On => {
			base_level_approx(reinforcements.len(), reinforcements[0], current_time, d)
		}
		OptimizedLearning::Fixed(k) => {
			base_level_mixed(reinforcements, current_time, d, k.get(), zero_age)
		}
	}
}

fn age_with_policy(current_time: f64, timestamp: f64, policy: ZeroAgePolicy) -> Option<f64> {
	let age = current_time - timestamp;
	if age > 0.0 {
		Some(age)
	} else {
		match policy {
			ZeroAgePolicy::Skip => None,
			ZeroAgePolicy::EpsilonFloor(eps) => Some(eps),
		}
	}
}

fn base_level_exact(reinforcements: &[f64], t: f64, d: f64, policy: ZeroAgePolicy) -> f64 {
	let sum: f64 = reinforcements
		.iter()
		.filter_map(|&ts| age_with_policy(t, ts, policy))
		.map(|age| age.powf(-d))
		.sum();
	if sum <= 0.0 {
		f64::NEG_INFINITY
	} else {
		sum.ln()
	}
}

/// `B = ln(n / (1 - d)) - d * ln(L)`, requires `d < 1`.
fn base_level_approx(n: usize, first_time: f64, t: f64, d: f64) -> f64 {
	#[allow(clippy::cast_precision_loss)]
	let n_f = n as f64;
	let l = (t - first_time).max(f64::EPSILON);
	(n_f / (1.0 - d)).ln() - d * l.ln()
}

/// Exact formula on the `k` most recent timestamps; the remaining (older)
/// timestamps are approximated as if uniformly distributed between the
/// first reinforcement and the boundary of the exact window, preserving
/// total count.
fn base_level_mixed(reinforcements: &[f64], t: f64, d: f64, k: usize, policy: ZeroAgePolicy) -> f64 {
	let n = reinforcements.len();
	if k >= n {
		return base_level_exact(reinforcements, t, d, policy);
	}

	let older = &reinforcements[..n - k];
	let recent = &reinforcements[n - k..];
	#[allow(clippy::cast_precision_loss)]
	let m = older.len() as f64;

	let exact_sum: f64 = recent
		.iter()
		.filter_map(|&ts| age_with_policy(t, ts, policy))
		.map(|age| age.powf(-d))
		.sum();

	let age_oldest = (t - older[0]).max(f64::EPSILON);
	let age_boundary = (t - recent[0]).max(f64::EPSILON);

	let approx_sum = if (age_oldest - age_boundary).abs() < 1e-12 {
		m * age_boundary.powf(-d)
	} else if (d - 1.0).abs() < 1e-12 {
		m * (age_oldest.ln() - age_boundary.ln()) / (age_oldest - age_boundary)
	} else {
		m * (age_oldest.powf(1.0 - d) - age_boundary.powf(1.0 - d)) / ((1.0 - d) * (age_oldest - age_boundary))
	};

	let total = exact_sum + approx_sum;
	if total <= 0.0 {
		f64::NEG_INFINITY
	} else {
		total.ln()
	}
}

/// Per-attribute contribution to the partial-match penalty, kept for
/// activation-history recording and salience.
#[derive(Debug, Clone)]
pub struct MatchContribution {
	/// Attribute name.
	pub attribute: String,
	/// Natural-scale similarity `S_ik` between the chunk's value and the
	/// probe's value.
	pub similarity: f64,
}

/// Result of partial-matching a chunk against a probe.
#[derive(Debug, Clone)]
pub struct PartialMatch {
	/// `P_i = μ · Σ_k ω_k (S_ik - 1)`.
	pub penalty: f64,
	/// Per-attribute similarity contributions (for history/salience).
	pub contributions: Vec<MatchContribution>,
}

/// Partial-match a chunk's attributes against a probe.
///
/// Returns `Ok(None)` if the chunk is ineligible: an exact-match attribute
/// (no similarity function registered) differs between chunk and probe, a
/// probe attribute is altogether absent from the chunk, or mismatch is
/// disabled and any attribute's similarity is less than 1.
///
/// # Errors
///
/// Returns `SimilarityContract` if a registered custom similarity function
/// returns an out-of-range or asymmetric value for this pair.
pub fn partial_match(
	probe: &AttributeMap,
	chunk: &AttributeMap,
	registry: &SimilarityRegistry,
	mismatch: Option<f64>,
) -> Result<Option<PartialMatch>> {
	let mut raw_sum = 0.0;
	let mut any_partial_mismatch = false;
	let mut contributions = Vec::with_capacity(probe.len());

	for (attribute, probe_value) in probe {
		let Some(chunk_value) = chunk.get(attribute) else {
			return Ok(None);
		};

		if registry.has_similarity(attribute) {
			let Some(similarity) = registry.similarity(attribute, chunk_value, probe_value) else {
				return Ok(None);
			};
			let similarity = similarity?;
			let weight = registry.weight(attribute);
			if similarity < 1.0 {
				any_partial_mismatch = true;
			}
			raw_sum += weight * (similarity - 1.0);
			contributions.push(MatchContribution {
				attribute: attribute.clone(),
				similarity,
			});
		} else if chunk_value != probe_value {
			return Ok(None);
		}
	}

	Ok(match mismatch {
		None if any_partial_mismatch => None,
		None => Some(PartialMatch {
			penalty: 0.0,
			contributions,
		}),
		Some(mu) => Some(PartialMatch {
			penalty: mu * raw_sum,
			contributions,
		}),
	})
}

/// Total activation `A_i = B_i + ε_i + P_i`.
#[inline]
#[must_use]
pub fn total_activation(base_level: f64, noise: f64, penalty: f64) -> f64 {
	base_level + noise + penalty
}

/// Softmax weight `exp(A_i / τ)` used by blending.
#[inline]
#[must_use]
pub fn blend_weight(activation: f64, temperature: f64) -> f64 {
	(activation / temperature).exp()
}

/// Default temperature `σ·√2` used when the consumer hasn't set one.
#[inline]
#[must_use]
pub fn default_temperature(noise_sigma: f64) -> f64 {
	noise_sigma * std::f64::consts::SQRT_2
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::similarity::SimilarityRegistry;
	use crate::value::Value;
	use std::sync::Arc;

	fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
		pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
	}

	#[test]
	fn decay_disabled_gives_zero_base_level() {
		let b = base_level_activation(&[0.0, 1.0], 10.0, None, OptimizedLearning::Off, ZeroAgePolicy::default());
		assert_eq!(b, 0.0);
	}

	#[test]
	fn decay_zero_is_pure_frequency() {
		let reinforcements = vec![1.0, 2.0, 3.0];
		let b = base_level_activation(
			&reinforcements,
			10.0,
			Some(0.0),
			OptimizedLearning::Off,
			ZeroAgePolicy::default(),
		);
		assert!((b - (reinforcements.len() as f64).ln()).abs() < 1e-9);
	}

	#[test]
	fn more_recent_reinforcement_increases_activation() {
		let recent = base_level_activation(&[9.0], 10.0, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::default());
		let old = base_level_activation(&[1.0], 10.0, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::default());
		assert!(recent > old);
	}

	#[test]
	fn approx_requires_d_less_than_one_and_matches_exact_for_single_reinforcement() {
		// With a single reinforcement, first-occurrence time == the reinforcement,
		// so "on" mode should roughly track the exact formula.
		let t = 10.0;
		let exact = base_level_activation(&[1.0], t, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::default());
		let approx = base_level_activation(&[1.0], t, Some(0.5), OptimizedLearning::On, ZeroAgePolicy::default());
		// ln(1/(1-0.5)) - 0.5*ln(9) = ln(2) - 0.5*ln(9)
		assert!((approx - (2f64.ln() - 0.5 * 9f64.ln())).abs() < 1e-9);
		assert_ne!(exact, approx); // different formulas, not expected to coincide
	}

	#[test]
	fn mixed_mode_falls_back_to_exact_when_k_covers_all() {
		let reinforcements = vec![1.0, 2.0, 3.0];
		let exact = base_level_activation(&reinforcements, 10.0, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::default());
		let mixed = base_level_activation(
			&reinforcements,
			10.0,
			Some(0.5),
			OptimizedLearning::Fixed(NonZeroUsize::new(10).unwrap()),
			ZeroAgePolicy::default(),
		);
		assert!((exact - mixed).abs() < 1e-9);
	}

	#[test]
	fn zero_age_epsilon_floor_is_finite() {
		let b = base_level_activation(&[10.0], 10.0, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::default());
		assert!(b.is_finite());
	}

	#[test]
	fn zero_age_skip_can_yield_neg_infinity() {
		let b = base_level_activation(&[10.0], 10.0, Some(0.5), OptimizedLearning::Off, ZeroAgePolicy::Skip);
		assert_eq!(b, f64::NEG_INFINITY);
	}

	#[test]
	fn partial_match_exact_attribute_mismatch_is_ineligible() {
		let reg = SimilarityRegistry::new();
		let probe = attrs(&[("color", Value::symbol("red"))]);
		let chunk = attrs(&[("color", Value::symbol("blue"))]);
		assert!(partial_match(&probe, &chunk, &reg, Some(1.0)).unwrap().is_none());
	}

	#[test]
	fn partial_match_without_mismatch_disabled_requires_exact() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom(
			"r",
			Arc::new(|a: &Value, b: &Value| 1.0 - (a.as_f64().unwrap() - b.as_f64().unwrap()).abs() / 16.0),
			1.0,
		);
		let probe = attrs(&[("r", Value::number(2.0))]);
		let chunk = attrs(&[("r", Value::number(3.0))]);
		assert!(partial_match(&probe, &chunk, &reg, None).unwrap().is_none());

		let chunk_exact = attrs(&[("r", Value::number(2.0))]);
		assert!(partial_match(&probe, &chunk_exact, &reg, None).unwrap().is_some());
	}

	#[test]
	fn partial_match_with_mismatch_scales_penalty() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom(
			"r",
			Arc::new(|a: &Value, b: &Value| 1.0 - (a.as_f64().unwrap() - b.as_f64().unwrap()).abs() / 16.0),
			1.0,
		);
		let probe = attrs(&[("r", Value::number(2.0))]);
		let chunk = attrs(&[("r", Value::number(6.0))]);
		let m = partial_match(&probe, &chunk, &reg, Some(1.0)).unwrap().unwrap();
		// similarity = 1 - 4/16 = 0.75, penalty = 1*(0.75-1) = -0.25
		assert!((m.penalty - (-0.25)).abs() < 1e-9);
	}
}
