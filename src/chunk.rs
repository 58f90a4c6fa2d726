//! Chunks: immutable attribute-value experiences with a reinforcement history.

use crate::value::Value;
use std::collections::BTreeMap;

/// Stable identity assigned to a chunk on first `learn`.
pub type ChunkId = u64;

/// A chunk's attribute map. `BTreeMap` gives canonical (sorted) iteration
/// order, which both the content-addressed store key and `print_chunks`
/// depend on.
pub type AttributeMap = BTreeMap<String, Value>;

/// A learned experience.
///
/// Chunks are created on first `learn`, mutated only by appending
/// reinforcement timestamps, and removed only by explicit `forget`/`reset`.
#[derive(Debug, Clone)]
pub struct Chunk {
	/// Stable identity, assigned on first learn.
	pub id: ChunkId,
	/// The attribute-value mapping that defines this chunk's content.
	pub attributes: AttributeMap,
	/// Time at which this chunk was first learned.
	pub created_at: f64,
	/// Reinforcement timestamps, strictly non-decreasing.
	pub reinforcements: Vec<f64>,
}

impl Chunk {
	/// Number of times this chunk has been reinforced (including creation).
	#[must_use]
	pub fn reference_count(&self) -> usize {
		self.reinforcements.len()
	}

	/// The value of `attribute` on this chunk, if present.
	#[must_use]
	pub fn get(&self, attribute: &str) -> Option<&Value> {
		self.attributes.get(attribute)
	}
}

/// Canonical key used to content-address chunks by their attribute tuple.
///
/// Built from the `BTreeMap`'s sorted iteration order, so two attribute maps
/// with identical content always produce identical keys regardless of the
/// order attributes were inserted in.
pub(crate) fn canonical_key(attributes: &AttributeMap) -> Vec<(String, Value)> {
	attributes
		.iter()
		.map(|(k, v)| (k.clone(), v.clone()))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn canonical_key_is_order_independent() {
		let mut a = AttributeMap::new();
		a.insert("b".to_string(), Value::number(2.0));
		a.insert("a".to_string(), Value::number(1.0));

		let mut b = AttributeMap::new();
		b.insert("a".to_string(), Value::number(1.0));
		b.insert("b".to_string(), Value::number(2.0));

		assert_eq!(canonical_key(&a), canonical_key(&b));
	}
}
