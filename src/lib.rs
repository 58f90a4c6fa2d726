//! # Declarative Memory
//!
//! A small ACT-R style declarative memory module: content-addressed chunks,
//! base-level activation from reinforcement history, partial-matching
//! retrieval, and blended-value queries.
//!
//! ## Why partial matching?
//!
//! A lookup table answers "do I have this exact experience?" Declarative
//! memory answers a softer question: "what does my experience say, weighted
//! by how similar it is and how reliably I remember it?" That softness comes
//! from three independent knobs:
//!
//! - **Base-level activation** `B_i` — recency and frequency of
//!   reinforcement, so chunks learned often and recently dominate.
//! - **Noise** `ε_i` — a logistic perturbation so retrieval isn't perfectly
//!   deterministic, controlling how sharply activation differences matter.
//! - **Partial match** `P_i` — a penalty for probe attributes that don't
//!   match exactly, scaled by per-attribute similarity functions and a global
//!   mismatch penalty `μ`.
//!
//! ## Core Concepts
//!
//! ### Activation
//!
//! ```text
//! A_i = B_i + ε_i + P_i
//! B_i = ln Σ_j (t - t_ij)^(-d)
//! P_i = μ · Σ_k ω_k (S_ik - 1)
//! ```
//!
//! ### Retrieval
//!
//! 1. Filter chunks against a probe: exact-match on attributes with no
//!    similarity function, similarity-weighted otherwise.
//! 2. Compute each eligible chunk's total activation.
//! 3. Cull anything below the activation threshold, if one is set.
//! 4. Return the highest-activation survivor, breaking ties at random.
//!
//! ### Blending
//!
//! Rather than returning one chunk, `blend` computes a probability-weighted
//! average of a numeric attribute across all eligible chunks, with weights
//! `w_i = exp(A_i / τ)` (a softmax over total activation).
//!
//! ## Example
//!
//! ```rust
//! use declarative_memory::{Memory, MemoryParameters};
//! use std::collections::BTreeMap;
//!
//! let mut memory = Memory::new(MemoryParameters {
//!     decay: Some(0.5),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let mut chunk = BTreeMap::new();
//! chunk.insert("color".to_string(), "red".into());
//! chunk.insert("count".to_string(), 3.0.into());
//! memory.learn(chunk.clone(), 1.0).unwrap();
//!
//! let mut probe = BTreeMap::new();
//! probe.insert("color".to_string(), "red".into());
//! let retrieved = memory.retrieve(&probe, false).unwrap();
//! assert!(retrieved.is_some());
//! ```
//!
//! ## Non-goals
//!
//! This crate implements the declarative memory module only: there is no
//! procedural module, goal buffer, or production system, and no spreading
//! activation across an association graph. Each `Memory` is a single,
//! independent store; composing several for different memory types is left
//! to the caller.
//!
//! ## References
//!
//! - Anderson, J. R., & Lebiere, C. (1998). *The Atomic Components of
//!   Thought* — the ACT-R declarative memory formulas this crate implements.
//! - Anderson, J. R., et al. (2004). *An integrated theory of the mind*.
//!   *Psychological Review*, 111(4).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod activation;
mod chunk;
mod error;
mod history;
mod memory;
mod retrieval;
mod rng;
mod salience;
mod similarity;
mod store;
mod value;

pub use activation::{OptimizedLearning, ZeroAgePolicy};
pub use chunk::{AttributeMap, Chunk, ChunkId};
pub use error::{MemoryError, Result};
pub use history::ActivationRecord;
pub use memory::{FixedNoiseGuard, HistoryGuard, Memory, MemoryParameters};
pub use salience::DerivativeUndefinedPolicy;
pub use similarity::{DerivativeFn, SimilarityFn};
pub use store::IndexSpec;
pub use value::Value;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn basic_learn_and_retrieve() {
		let mut memory = Memory::new(MemoryParameters {
			decay: Some(0.5),
			..Default::default()
		})
		.unwrap();

		let mut chunk = AttributeMap::new();
		chunk.insert("color".to_string(), Value::symbol("red"));
		chunk.insert("count".to_string(), Value::number(3.0));
		memory.learn(chunk, 1.0).unwrap();

		let mut other = AttributeMap::new();
		other.insert("color".to_string(), Value::symbol("blue"));
		other.insert("count".to_string(), Value::number(1.0));
		memory.learn(other, 1.0).unwrap();

		let mut probe = AttributeMap::new();
		probe.insert("color".to_string(), Value::symbol("red"));
		let retrieved = memory.retrieve(&probe, false).unwrap().unwrap();
		assert_eq!(retrieved.get("color"), Some(&Value::symbol("red")));
	}

	#[test]
	fn blend_averages_numeric_attribute() {
		let mut memory = Memory::new(MemoryParameters {
			decay: Some(0.5),
			temperature: Some(1.0),
			..Default::default()
		})
		.unwrap();

		for count in [2.0, 4.0, 6.0] {
			let mut chunk = AttributeMap::new();
			chunk.insert("kind".to_string(), Value::symbol("widget"));
			chunk.insert("count".to_string(), Value::number(count));
			memory.learn(chunk, 1.0).unwrap();
		}

		let mut probe = AttributeMap::new();
		probe.insert("kind".to_string(), Value::symbol("widget"));
		let bv = memory.blend("count", &probe).unwrap().unwrap();
		assert!((2.0..=6.0).contains(&bv));
	}

	#[test]
	fn retrieving_against_empty_memory_is_none() {
		let mut memory = Memory::default();
		let probe = AttributeMap::new();
		assert!(memory.retrieve(&probe, false).unwrap().is_none());
	}
}
