//! Candidate filtering and the numeric core of retrieval/blending.
//!
//! The stateful parts of the pipeline (noise sampling, tie-breaking, history
//! recording) live on [`crate::memory::Memory`]; this module holds the pure
//! pieces: index-accelerated filtering and the softmax/argmax math shared by
//! `retrieve`, `blend`, `discrete_blend`, and `best_blend`.

use crate::activation::{partial_match, PartialMatch};
use crate::chunk::{AttributeMap, ChunkId};
use crate::error::Result;
use crate::rng::MemoryRng;
use crate::similarity::SimilarityRegistry;
use crate::store::ChunkStore;

/// A chunk that survived partial-match filtering against a probe.
pub(crate) struct EligibleCandidate {
	pub chunk_id: ChunkId,
	pub attributes: AttributeMap,
	pub reinforcements: Vec<f64>,
	pub creation_time: f64,
	pub partial_match: PartialMatch,
}

/// Filter the store's chunks against `probe`, using the secondary index to
/// narrow the scan when the index covers exact-match probe attributes.
///
/// # Errors
///
/// Returns `SimilarityContract` if a registered custom similarity function
/// returns an out-of-range or asymmetric value against any candidate.
pub(crate) fn eligible_candidates(
	store: &ChunkStore,
	registry: &SimilarityRegistry,
	probe: &AttributeMap,
	mismatch: Option<f64>,
) -> Result<Vec<EligibleCandidate>> {
	let restricted = index_restricted_ids(store, registry, probe);

	let chunks: Box<dyn Iterator<Item = &crate::chunk::Chunk>> = match &restricted {
		Some(ids) => Box::new(store.chunks().filter(|c| ids.contains(&c.id))),
		None => Box::new(store.chunks()),
	};

	let mut candidates = Vec::new();
	for chunk in chunks {
		if let Some(pm) = partial_match(probe, &chunk.attributes, registry, mismatch)? {
			candidates.push(EligibleCandidate {
				chunk_id: chunk.id,
				attributes: chunk.attributes.clone(),
				reinforcements: chunk.reinforcements.clone(),
				creation_time: chunk.created_at,
				partial_match: pm,
			});
		}
	}
	Ok(candidates)
}

/// Restrict candidates to an index-backed id set when the probe supplies
/// every indexed attribute and none of them has a similarity function
/// (i.e. they're all exact-match attributes).
fn index_restricted_ids(
	store: &ChunkStore,
	registry: &SimilarityRegistry,
	probe: &AttributeMap,
) -> Option<std::collections::HashSet<ChunkId>> {
	let index = store.index()?;
	if index.iter().any(|attr| registry.has_similarity(attr)) {
		return None;
	}
	if !index.iter().all(|attr| probe.contains_key(attr)) {
		return None;
	}
	store.index_lookup(probe)
}

/// Softmax weights `w_i = exp(A_i / τ)` for a set of total activations.
#[must_use]
pub(crate) fn softmax_weights(activations: &[f64], temperature: f64) -> Vec<f64> {
	activations
		.iter()
		.map(|&a| crate::activation::blend_weight(a, temperature))
		.collect()
}

/// Blended value `Σ s_i w_i / Σ w_j`, and the per-candidate retrieval
/// probabilities `p_i = w_i / Σ w_j`.
#[must_use]
pub(crate) fn blend(values: &[f64], weights: &[f64]) -> (f64, Vec<f64>) {
	let total: f64 = weights.iter().sum();
	if total == 0.0 {
		let n = weights.len().max(1);
		#[allow(clippy::cast_precision_loss)]
		let uniform = 1.0 / n as f64;
		return (values.iter().sum::<f64>() / values.len().max(1) as f64, vec![uniform; weights.len()]);
	}
	let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
	let bv: f64 = values.iter().zip(&probabilities).map(|(s, p)| s * p).sum();
	(bv, probabilities)
}

/// Index of the maximum activation, breaking ties uniformly at random.
#[must_use]
pub(crate) fn argmax_with_ties(activations: &[f64], rng: &mut MemoryRng) -> Option<usize> {
	if activations.is_empty() {
		return None;
	}
	let max = activations
		.iter()
		.copied()
		.fold(f64::NEG_INFINITY, f64::max);
	let tied: Vec<usize> = activations
		.iter()
		.enumerate()
		.filter(|(_, &a)| a == max)
		.map(|(i, _)| i)
		.collect();
	Some(tied[rng.choose_index(tied.len())])
}
