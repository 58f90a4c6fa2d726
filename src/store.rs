//! Content-addressed chunk store with optional secondary indexing.

use crate::chunk::{canonical_key, AttributeMap, Chunk, ChunkId};
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// Attribute names used to accelerate candidate filtering.
pub type IndexSpec = Vec<String>;

/// Content-addressed collection of chunks.
///
/// Each distinct attribute-tuple is stored once, with a list of
/// reinforcement timestamps. Insertion order is preserved for stable
/// enumeration (`chunks()`, `print_chunks`).
#[derive(Debug, Default)]
pub struct ChunkStore {
	chunks: HashMap<ChunkId, Chunk>,
	/// Insertion order of live chunk ids.
	order: Vec<ChunkId>,
	by_key: HashMap<Vec<(String, Value)>, ChunkId>,
	next_id: ChunkId,
	index: Option<IndexSpec>,
	/// Indexed attribute value-tuple -> chunk ids sharing those exact values.
	index_map: HashMap<Vec<Value>, HashSet<ChunkId>>,
}

impl ChunkStore {
	/// Create an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Set (or clear) the secondary index, rebuilding it from current chunks.
	pub fn set_index(&mut self, index: Option<IndexSpec>) {
		self.index = index;
		self.rebuild_index();
	}

	/// The declared index attributes, if any.
	#[must_use]
	pub fn index(&self) -> Option<&[String]> {
		self.index.as_deref()
	}

	fn rebuild_index(&mut self) {
		self.index_map.clear();
		if let Some(index) = self.index.clone() {
			for id in self.order.clone() {
				if let Some(chunk) = self.chunks.get(&id) {
					if let Some(key) = index_key(&index, &chunk.attributes) {
						self.index_map.entry(key).or_default().insert(id);
					}
				}
			}
		}
	}

	fn index_insert(&mut self, id: ChunkId, attributes: &AttributeMap) {
		if let Some(index) = &self.index {
			if let Some(key) = index_key(index, attributes) {
				self.index_map.entry(key).or_default().insert(id);
			}
		}
	}

	fn index_remove(&mut self, id: ChunkId, attributes: &AttributeMap) {
		if let Some(index) = &self.index {
			if let Some(key) = index_key(index, attributes) {
				if let Some(set) = self.index_map.get_mut(&key) {
					set.remove(&id);
					if set.is_empty() {
						self.index_map.remove(&key);
					}
				}
			}
		}
	}

	/// Candidate chunk ids sharing the given indexed attribute values, if the
	/// store has an index and the probe supplies all indexed attributes.
	#[must_use]
	pub fn index_lookup(&self, probe: &AttributeMap) -> Option<HashSet<ChunkId>> {
		let index = self.index.as_ref()?;
		let key = index_key(index, probe)?;
		Some(self.index_map.get(&key).cloned().unwrap_or_default())
	}

	/// Canonicalize `attributes`, look up or insert the chunk, append
	/// `time` to its reinforcement list, and return its id.
	pub fn learn(&mut self, attributes: AttributeMap, time: f64) -> ChunkId {
		let key = canonical_key(&attributes);
		if let Some(&id) = self.by_key.get(&key) {
			if let Some(chunk) = self.chunks.get_mut(&id) {
				chunk.reinforcements.push(time);
			}
			return id;
		}

		let id = self.next_id;
		self.next_id += 1;

		self.index_insert(id, &attributes);
		let chunk = Chunk {
			id,
			attributes,
			created_at: time,
			reinforcements: vec![time],
		};
		self.by_key.insert(key, id);
		self.order.push(id);
		self.chunks.insert(id, chunk);
		id
	}

	/// Remove one occurrence of `time` from the chunk matching `attributes`.
	/// Deletes the chunk entirely if that empties its reinforcement list.
	/// Returns `false` if no matching chunk or timestamp was found.
	pub fn forget(&mut self, attributes: &AttributeMap, time: f64) -> bool {
		let key = canonical_key(attributes);
		let Some(&id) = self.by_key.get(&key) else {
			return false;
		};
		let Some(chunk) = self.chunks.get_mut(&id) else {
			return false;
		};
		let Some(pos) = chunk.reinforcements.iter().position(|&t| t == time) else {
			return false;
		};
		chunk.reinforcements.remove(pos);

		if chunk.reinforcements.is_empty() {
			let attributes = chunk.attributes.clone();
			self.chunks.remove(&id);
			self.by_key.remove(&key);
			self.order.retain(|&o| o != id);
			self.index_remove(id, &attributes);
		}
		true
	}

	/// Look up a chunk by id.
	#[must_use]
	pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
		self.chunks.get(&id)
	}

	/// All live chunks, in insertion order.
	pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
		self.order.iter().filter_map(|id| self.chunks.get(id))
	}

	/// Number of live chunks.
	#[must_use]
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Whether the store holds no chunks.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Clear all chunks, preserving a prepopulated subset if given.
	pub fn reset(&mut self, preserve: &[(AttributeMap, f64)]) {
		self.chunks.clear();
		self.order.clear();
		self.by_key.clear();
		self.index_map.clear();
		self.next_id = 0;
		for (attributes, time) in preserve {
			self.learn(attributes.clone(), *time);
		}
	}

	/// Render a table of chunks: ordinal name, attributes, creation time,
	/// reference count, and reinforcement timestamps.
	#[must_use]
	pub fn print_chunks(&self) -> String {
		let mut out = String::new();
		let width = self.order.len().to_string().len().max(4);
		for (i, chunk) in self.chunks().enumerate() {
			let attrs = chunk
				.attributes
				.iter()
				.map(|(k, v)| format!("{k}={v}"))
				.collect::<Vec<_>>()
				.join(", ");
			out.push_str(&format!(
				"Chunk-{:0width$} [{attrs}] created={} refs={} times={:?}\n",
				i,
				chunk.created_at,
				chunk.reference_count(),
				chunk.reinforcements,
				width = width,
			));
		}
		out
	}
}

fn index_key(index: &[String], attributes: &AttributeMap) -> Option<Vec<Value>> {
	index
		.iter()
		.map(|attr| attributes.get(attr).cloned())
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
		pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
	}

	#[test]
	fn relearn_reinforces_instead_of_duplicating() {
		let mut store = ChunkStore::new();
		let a = attrs(&[("x", Value::number(1.0))]);
		let id1 = store.learn(a.clone(), 0.0);
		let id2 = store.learn(a, 1.0);
		assert_eq!(id1, id2);
		assert_eq!(store.len(), 1);
		assert_eq!(store.get(id1).unwrap().reinforcements, vec![0.0, 1.0]);
	}

	#[test]
	fn forget_is_left_inverse_of_learn() {
		let mut store = ChunkStore::new();
		let a = attrs(&[("x", Value::number(1.0))]);
		store.learn(a.clone(), 0.0);
		assert_eq!(store.len(), 1);
		assert!(store.forget(&a, 0.0));
		assert_eq!(store.len(), 0);
	}

	#[test]
	fn forget_missing_timestamp_returns_false() {
		let mut store = ChunkStore::new();
		let a = attrs(&[("x", Value::number(1.0))]);
		store.learn(a.clone(), 0.0);
		assert!(!store.forget(&a, 5.0));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn index_lookup_restricts_candidates() {
		let mut store = ChunkStore::new();
		store.set_index(Some(vec!["kind".to_string()]));
		store.learn(attrs(&[("kind", Value::symbol("a")), ("v", Value::number(1.0))]), 0.0);
		store.learn(attrs(&[("kind", Value::symbol("b")), ("v", Value::number(2.0))]), 0.0);

		let probe = attrs(&[("kind", Value::symbol("a"))]);
		let hits = store.index_lookup(&probe).unwrap();
		assert_eq!(hits.len(), 1);
	}

	#[test]
	fn insertion_order_is_stable() {
		let mut store = ChunkStore::new();
		let ids: Vec<_> = (0..5)
			.map(|i| store.learn(attrs(&[("x", Value::number(f64::from(i)))]), 0.0))
			.collect();
		let observed: Vec<_> = store.chunks().map(|c| c.id).collect();
		assert_eq!(ids, observed);
	}
}
