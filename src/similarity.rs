//! Similarity registry: per-attribute similarity/derivative functions, with
//! a memoizing cache.

use crate::error::{MemoryError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Tolerance used when checking a custom similarity function's contract
/// (range and symmetry).
const CONTRACT_EPS: f64 = 1e-9;

/// A symmetric similarity function `ξ(x, y)`, expected to return a value in
/// `[0, 1]` (natural scale) regardless of the registry's ACT-R mode — the
/// registry itself applies the `[-1, 0]` offset when ACT-R mode is active.
pub type SimilarityFn = Arc<dyn Fn(&Value, &Value) -> f64 + Send + Sync>;

/// A (not necessarily symmetric) derivative function `d/dx ξ(x, y)`, defined
/// whenever `x != y`.
pub type DerivativeFn = Arc<dyn Fn(&Value, &Value) -> f64 + Send + Sync>;

#[derive(Clone)]
enum SimilaritySpec {
	/// Built-in equality similarity: 1 if equal, 0 otherwise.
	Equality,
	/// A user-supplied function.
	Custom(SimilarityFn),
}

#[derive(Clone)]
struct AttributeSimilarity {
	function: SimilaritySpec,
	weight: f64,
	derivative: Option<DerivativeFn>,
}

/// Cache key for a similarity lookup: canonicalized so `(x, y)` and `(y, x)`
/// share the same key.
type SimKey = (String, Value, Value);
/// Cache key for a derivative lookup: ordered, since derivatives need not be
/// symmetric.
type DerivKey = (String, Value, Value);

/// Per-memory registry of attribute similarity/derivative functions.
#[derive(Default)]
pub struct SimilarityRegistry {
	attributes: HashMap<String, AttributeSimilarity>,
	cache: RefCell<HashMap<SimKey, f64>>,
	derivative_cache: RefCell<HashMap<DerivKey, f64>>,
	use_actr_similarity: bool,
}

impl SimilarityRegistry {
	/// Create an empty registry.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Switch between natural `[0, 1]` and ACT-R `[-1, 0]` similarity scale.
	/// Invalidates the whole cache: cached values are stored in natural form,
	/// but the offset applied to *raw* user-function output changes.
	pub fn set_use_actr_similarity(&mut self, enabled: bool) {
		if self.use_actr_similarity != enabled {
			self.use_actr_similarity = enabled;
			self.cache.borrow_mut().clear();
			self.derivative_cache.borrow_mut().clear();
		}
	}

	/// Whether ACT-R similarity scale is active.
	#[must_use]
	pub fn use_actr_similarity(&self) -> bool {
		self.use_actr_similarity
	}

	/// Assign a built-in equality similarity function to `attribute`.
	pub fn set_equality(&mut self, attribute: &str, weight: f64) {
		self.invalidate(attribute);
		self.attributes.insert(
			attribute.to_string(),
			AttributeSimilarity {
				function: SimilaritySpec::Equality,
				weight,
				derivative: None,
			},
		);
	}

	/// Assign a custom similarity function (and weight) to `attribute`.
	pub fn set_custom(&mut self, attribute: &str, function: SimilarityFn, weight: f64) {
		self.invalidate(attribute);
		self.attributes.insert(
			attribute.to_string(),
			AttributeSimilarity {
				function: SimilaritySpec::Custom(function),
				weight,
				derivative: None,
			},
		);
	}

	/// Attach a derivative function to an attribute that already has a
	/// similarity function registered. No-op if the attribute is unknown.
	pub fn set_derivative(&mut self, attribute: &str, derivative: DerivativeFn) {
		if let Some(spec) = self.attributes.get_mut(attribute) {
			spec.derivative = Some(derivative);
			self.derivative_cache
				.borrow_mut()
				.retain(|(attr, _, _), _| attr != attribute);
		}
	}

	/// Clear the similarity (and derivative) function for `attribute`.
	pub fn clear(&mut self, attribute: &str) {
		self.invalidate(attribute);
		self.attributes.remove(attribute);
	}

	/// Total cache reset, used on `Memory::reset`.
	pub fn clear_cache(&self) {
		self.cache.borrow_mut().clear();
		self.derivative_cache.borrow_mut().clear();
	}

	fn invalidate(&self, attribute: &str) {
		self.cache.borrow_mut().retain(|(attr, _, _), _| attr != attribute);
		self.derivative_cache
			.borrow_mut()
			.retain(|(attr, _, _), _| attr != attribute);
	}

	/// Whether `attribute` has a similarity function registered.
	#[must_use]
	pub fn has_similarity(&self, attribute: &str) -> bool {
		self.attributes.contains_key(attribute)
	}

	/// The weight assigned to `attribute` (1.0 if unregistered).
	#[must_use]
	pub fn weight(&self, attribute: &str) -> f64 {
		self.attributes.get(attribute).map_or(1.0, |s| s.weight)
	}

	/// Compute (or fetch from cache) `ξ(x, y)` for `attribute`, always in
	/// natural `[0, 1]` form regardless of ACT-R mode.
	///
	/// Returns `None` if no similarity function is registered for
	/// `attribute`. Returns `Some(Err(SimilarityContract))` if a custom
	/// function returns an out-of-range value, or a value that disagrees
	/// with itself when its arguments are swapped (it must be symmetric).
	pub fn similarity(&self, attribute: &str, x: &Value, y: &Value) -> Option<Result<f64>> {
		let spec = self.attributes.get(attribute)?;

		let key = canonical_pair(attribute, x, y);
		if let Some(&cached) = self.cache.borrow().get(&key) {
			return Some(Ok(cached));
		}

		let natural = match &spec.function {
			SimilaritySpec::Equality => f64::from(u8::from(x == y)),
			SimilaritySpec::Custom(f) => {
				let forward = f(x, y);
				let backward = f(y, x);
				if (forward - backward).abs() > CONTRACT_EPS {
					return Some(Err(MemoryError::SimilarityContract {
						attribute: attribute.to_string(),
						reason: format!(
							"expected a symmetric function but xi({x:?}, {y:?}) = {forward} while xi({y:?}, {x:?}) = {backward}"
						),
					}));
				}
				let (lo, hi) = if self.use_actr_similarity { (-1.0, 0.0) } else { (0.0, 1.0) };
				if forward < lo - CONTRACT_EPS || forward > hi + CONTRACT_EPS {
					return Some(Err(MemoryError::SimilarityContract {
						attribute: attribute.to_string(),
						reason: format!("expected a value in [{lo}, {hi}] but got {forward}"),
					}));
				}
				if self.use_actr_similarity {
					forward + 1.0
				} else {
					forward
				}
			}
		};

		self.cache.borrow_mut().insert(key, natural);
		Some(Ok(natural))
	}

	/// Compute (or fetch from cache) `d/dx ξ(x, y)` for `attribute`. Returns
	/// `None` if no derivative function is registered, regardless of whether
	/// `x == y` (callers decide the undefined-derivative policy).
	#[must_use]
	pub fn derivative(&self, attribute: &str, x: &Value, y: &Value) -> Option<f64> {
		let spec = self.attributes.get(attribute)?;
		let derivative = spec.derivative.as_ref()?;

		let key = (attribute.to_string(), x.clone(), y.clone());
		if let Some(&cached) = self.derivative_cache.borrow().get(&key) {
			return Some(cached);
		}

		let value = derivative(x, y);
		self.derivative_cache.borrow_mut().insert(key, value);
		Some(value)
	}

	/// Whether `attribute` has a derivative function registered.
	#[must_use]
	pub fn has_derivative(&self, attribute: &str) -> bool {
		self.attributes
			.get(attribute)
			.is_some_and(|s| s.derivative.is_some())
	}
}

fn canonical_pair(attribute: &str, x: &Value, y: &Value) -> SimKey {
	if x <= y {
		(attribute.to_string(), x.clone(), y.clone())
	} else {
		(attribute.to_string(), y.clone(), x.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn equality_similarity() {
		let mut reg = SimilarityRegistry::new();
		reg.set_equality("x", 1.0);
		assert_eq!(reg.similarity("x", &Value::number(1.0), &Value::number(1.0)).unwrap().unwrap(), 1.0);
		assert_eq!(reg.similarity("x", &Value::number(1.0), &Value::number(2.0)).unwrap().unwrap(), 0.0);
	}

	#[test]
	fn cache_is_symmetric() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom(
			"x",
			Arc::new(|a: &Value, b: &Value| 1.0 - (a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)).abs() / 16.0),
			1.0,
		);
		let a = Value::number(2.0);
		let b = Value::number(6.0);
		let forward = reg.similarity("x", &a, &b).unwrap().unwrap();
		let backward = reg.similarity("x", &b, &a).unwrap().unwrap();
		assert!((forward - backward).abs() < 1e-12);
	}

	#[test]
	fn asymmetric_function_is_a_contract_violation() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom("x", Arc::new(|a: &Value, _b: &Value| if a.as_f64() == Some(2.0) { 0.9 } else { 0.1 }), 1.0);
		let err = reg.similarity("x", &Value::number(2.0), &Value::number(6.0)).unwrap();
		assert!(matches!(err, Err(MemoryError::SimilarityContract { .. })));
	}

	#[test]
	fn out_of_range_function_is_a_contract_violation() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom("x", Arc::new(|_: &Value, _: &Value| 1.5), 1.0);
		let err = reg.similarity("x", &Value::number(1.0), &Value::number(2.0)).unwrap();
		assert!(matches!(err, Err(MemoryError::SimilarityContract { .. })));
	}

	#[test]
	fn reassignment_invalidates_only_that_attribute() {
		let mut reg = SimilarityRegistry::new();
		reg.set_equality("x", 1.0);
		reg.set_equality("y", 1.0);
		let _ = reg.similarity("x", &Value::number(1.0), &Value::number(1.0));
		let _ = reg.similarity("y", &Value::number(1.0), &Value::number(1.0));
		assert_eq!(reg.cache.borrow().len(), 2);

		reg.set_equality("x", 2.0);
		assert_eq!(reg.cache.borrow().len(), 1);
	}

	#[test]
	fn natural_mode_requires_zero_one_range() {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom("x", Arc::new(|_: &Value, _: &Value| 0.7), 1.0);
		let natural = reg.similarity("x", &Value::number(1.0), &Value::number(2.0)).unwrap().unwrap();
		assert!((natural - 0.7).abs() < 1e-12);
	}

	#[test]
	fn actr_mode_offsets_minus_one_zero_functions_to_natural_form() {
		let mut reg = SimilarityRegistry::new();
		reg.set_use_actr_similarity(true);
		reg.set_custom("x", Arc::new(|_: &Value, _: &Value| -0.3), 1.0);
		let offset = reg.similarity("x", &Value::number(1.0), &Value::number(2.0)).unwrap().unwrap();
		assert!((offset - 0.7).abs() < 1e-12);
	}
}
