//! The `Memory` facade: the handle consumers construct and drive through
//! `learn`/`advance`/`retrieve`/`blend`/... Owns the chunk store, similarity
//! registry, RNG, parameter block, and activation history.

use crate::activation::{
	base_level_activation, default_temperature, total_activation, OptimizedLearning, ZeroAgePolicy,
};
use crate::chunk::{AttributeMap, Chunk, ChunkId};
use crate::error::{MemoryError, Result};
use crate::history::{ActivationHistory, ActivationRecord};
use crate::retrieval::{argmax_with_ties, blend as blend_values, eligible_candidates, softmax_weights, EligibleCandidate};
use crate::rng::MemoryRng;
use crate::salience::{self, BlendTrace, BlendTraceEntry, DerivativeUndefinedPolicy};
use crate::similarity::{DerivativeFn, SimilarityFn, SimilarityRegistry};
use crate::store::ChunkStore;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The tunable knobs governing activation, retrieval, and blending, plus
/// the ambient additions (zero-age policy, derivative-undefined policy,
/// RNG seed) needed to pin otherwise-ambiguous behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryParameters {
	/// σ ≥ 0: scale of logistic activation noise.
	pub noise: f64,
	/// d ∈ \[0, ∞) or `None` (disabled): base-level decay exponent.
	pub decay: Option<f64>,
	/// τ > 0 or `None` (auto = σ·√2): blending softmax temperature.
	pub temperature: Option<f64>,
	/// μ ≥ 0 or `None` (disabled ≡ +∞, exact matches only): mismatch penalty.
	pub mismatch: Option<f64>,
	/// Minimum activation for successful retrieval, or `None` (disabled).
	pub threshold: Option<f64>,
	/// Base-level approximation scheme.
	pub optimized_learning: OptimizedLearning,
	/// Natural `[0,1]` scale (false) vs ACT-R `[-1,0]` scale (true).
	pub use_actr_similarity: bool,
	/// Attributes used to accelerate candidate filtering, if any.
	pub index: Option<Vec<String>>,
	/// How to handle a reinforcement at age zero in the exact base-level
	/// formula.
	pub zero_age_policy: ZeroAgePolicy,
	/// How `salience` resolves a derivative at `x == y`.
	pub derivative_undefined_policy: DerivativeUndefinedPolicy,
	/// RNG seed. `None` seeds from OS entropy.
	pub seed: Option<u64>,
}

impl Default for MemoryParameters {
	fn default() -> Self {
		Self {
			noise: 0.0,
			decay: Some(0.5),
			temperature: None,
			mismatch: None,
			threshold: None,
			optimized_learning: OptimizedLearning::Off,
			use_actr_similarity: false,
			index: None,
			zero_age_policy: ZeroAgePolicy::default(),
			derivative_undefined_policy: DerivativeUndefinedPolicy::default(),
			seed: None,
		}
	}
}

fn validate(params: &MemoryParameters) -> Result<()> {
	if params.noise < 0.0 {
		return Err(MemoryError::InvalidParameter {
			parameter: "noise",
			reason: "must be >= 0".to_string(),
		});
	}
	if let Some(d) = params.decay {
		if d < 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "decay",
				reason: "must be >= 0".to_string(),
			});
		}
	}
	if let Some(tau) = params.temperature {
		if tau <= 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "temperature",
				reason: "must be > 0".to_string(),
			});
		}
	}
	if let Some(mu) = params.mismatch {
		if mu < 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "mismatch",
				reason: "must be >= 0".to_string(),
			});
		}
	}
	match params.optimized_learning {
		OptimizedLearning::On => match params.decay {
			Some(d) if d < 1.0 => {}
			_ => {
				return Err(MemoryError::InvalidParameter {
					parameter: "optimized_learning",
					reason: "\"on\" requires decay < 1".to_string(),
				})
			}
		},
		OptimizedLearning::Fixed(_) => {
			if let Some(d) = params.decay {
				if d >= 1.0 {
					return Err(MemoryError::InvalidParameter {
						parameter: "optimized_learning",
						reason: "a fixed history window requires decay < 1".to_string(),
					});
				}
			}
		}
		OptimizedLearning::Off => {}
	}
	Ok(())
}

struct ComputedActivation<'c> {
	candidate: &'c EligibleCandidate,
	base_level: f64,
	noise: f64,
	total: f64,
}

/// Scoped acquisition restoring the previous `fixed_noise` state on drop.
pub struct FixedNoiseGuard<'a> {
	memory: &'a mut Memory,
	previous: bool,
}

impl Drop for FixedNoiseGuard<'_> {
	fn drop(&mut self) {
		self.memory.fixed_noise_active = self.previous;
		self.memory.noise_cache.clear();
	}
}

/// Scoped acquisition restoring the previous `activation_history` enabled
/// state on drop.
pub struct HistoryGuard<'a> {
	memory: &'a mut Memory,
	previous: bool,
}

impl Drop for HistoryGuard<'_> {
	fn drop(&mut self) {
		self.memory.history.set_enabled(self.previous);
	}
}

/// A declarative memory: chunks plus the configuration and machinery to
/// learn, retrieve, and blend over them.
pub struct Memory {
	store: ChunkStore,
	registry: SimilarityRegistry,
	rng: MemoryRng,
	history: ActivationHistory,
	last_blend_trace: Option<BlendTrace>,
	noise_cache: HashMap<(ChunkId, u64), f64>,
	fixed_noise_active: bool,
	current_time: f64,
	params: MemoryParameters,
}

impl Memory {
	/// Construct a memory with the given parameters.
	///
	/// # Errors
	///
	/// Returns `InvalidParameter` if any parameter is out of domain.
	pub fn new(params: MemoryParameters) -> Result<Self> {
		validate(&params)?;

		let mut registry = SimilarityRegistry::new();
		registry.set_use_actr_similarity(params.use_actr_similarity);

		let mut store = ChunkStore::new();
		store.set_index(params.index.clone());

		let rng = match params.seed {
			Some(seed) => MemoryRng::from_seed(seed),
			None => MemoryRng::from_entropy(),
		};

		Ok(Self {
			store,
			registry,
			rng,
			history: ActivationHistory::default(),
			last_blend_trace: None,
			noise_cache: HashMap::new(),
			fixed_noise_active: false,
			current_time: 0.0,
			params,
		})
	}

	// -- time & learning ---------------------------------------------------

	/// Current time. Non-negative, monotonically non-decreasing.
	#[must_use]
	pub fn current_time(&self) -> f64 {
		self.current_time
	}

	/// Advance `current_time` by `delta`.
	///
	/// # Errors
	///
	/// Returns `InvalidTime` if `delta < 0`.
	pub fn advance(&mut self, delta: f64) -> Result<()> {
		if delta < 0.0 {
			return Err(MemoryError::InvalidTime {
				reason: format!("advance delta must be >= 0, got {delta}"),
			});
		}
		self.current_time += delta;
		self.noise_cache.clear();
		Ok(())
	}

	/// Learn `attributes`: look up or insert the chunk, reinforce it at
	/// `current_time`, then advance time by `advance`. Returns the chunk id.
	///
	/// # Errors
	///
	/// Returns `InvalidTime` if `advance < 0`.
	pub fn learn(&mut self, attributes: AttributeMap, advance: f64) -> Result<ChunkId> {
		if advance < 0.0 {
			return Err(MemoryError::InvalidTime {
				reason: format!("advance delta must be >= 0, got {advance}"),
			});
		}
		let id = self.store.learn(attributes, self.current_time);
		if advance > 0.0 {
			self.advance(advance)?;
		}
		Ok(id)
	}

	/// Remove one reinforcement at `time` from the chunk matching
	/// `attributes`, deleting the chunk if that empties it. Returns `false`
	/// if no matching chunk/timestamp was found.
	pub fn forget(&mut self, attributes: &AttributeMap, time: f64) -> bool {
		self.store.forget(attributes, time)
	}

	/// Clear all chunks, optionally re-learning a prepopulated subset
	/// (each as `(attributes, time)`).
	pub fn reset(&mut self, preserve: &[(AttributeMap, f64)]) {
		self.store.reset(preserve);
		self.registry.clear_cache();
		self.history.clear();
		self.noise_cache.clear();
		self.last_blend_trace = None;
	}

	/// All live chunks, in insertion order.
	pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
		self.store.chunks()
	}

	/// Render a table of chunks for introspection.
	#[must_use]
	pub fn print_chunks(&self) -> String {
		self.store.print_chunks()
	}

	// -- similarity registry ------------------------------------------------

	/// Register the built-in equality similarity for `attribute`.
	///
	/// # Errors
	///
	/// Returns `InvalidParameter` if `weight <= 0`.
	pub fn similarity_equality(&mut self, attribute: &str, weight: f64) -> Result<()> {
		if weight <= 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "weight",
				reason: "must be > 0".to_string(),
			});
		}
		self.registry.set_equality(attribute, weight);
		Ok(())
	}

	/// Register a custom similarity function for `attribute`.
	///
	/// # Errors
	///
	/// Returns `InvalidParameter` if `weight <= 0`.
	pub fn similarity_fn(&mut self, attribute: &str, function: SimilarityFn, weight: f64) -> Result<()> {
		if weight <= 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "weight",
				reason: "must be > 0".to_string(),
			});
		}
		self.registry.set_custom(attribute, function, weight);
		Ok(())
	}

	/// Attach a derivative function to an already-registered attribute.
	pub fn derivative_fn(&mut self, attribute: &str, derivative: DerivativeFn) {
		self.registry.set_derivative(attribute, derivative);
	}

	/// Clear the similarity (and derivative) function for `attribute`.
	pub fn clear_similarity(&mut self, attribute: &str) {
		self.registry.clear(attribute);
	}

	// -- parameters -----------------------------------------------------

	/// Current parameter block.
	#[must_use]
	pub fn parameters(&self) -> &MemoryParameters {
		&self.params
	}

	fn set_params(&mut self, params: MemoryParameters) -> Result<()> {
		validate(&params)?;
		self.registry.set_use_actr_similarity(params.use_actr_similarity);
		if params.index != self.params.index {
			self.store.set_index(params.index.clone());
		}
		self.params = params;
		Ok(())
	}

	/// Set `noise` (σ ≥ 0).
	///
	/// # Errors
	/// Returns `InvalidParameter` if `noise < 0`.
	pub fn set_noise(&mut self, noise: f64) -> Result<()> {
		let mut p = self.params.clone();
		p.noise = noise;
		self.set_params(p)
	}

	/// Set `decay` (`None` disables decay).
	///
	/// # Errors
	/// Returns `InvalidParameter` if `decay < 0`, or if it would leave
	/// `optimized_learning` in an invalid combination.
	pub fn set_decay(&mut self, decay: Option<f64>) -> Result<()> {
		let mut p = self.params.clone();
		p.decay = decay;
		self.set_params(p)
	}

	/// Set `temperature` (`None` = auto, σ·√2).
	///
	/// # Errors
	/// Returns `InvalidParameter` if `temperature <= 0`.
	pub fn set_temperature(&mut self, temperature: Option<f64>) -> Result<()> {
		let mut p = self.params.clone();
		p.temperature = temperature;
		self.set_params(p)
	}

	/// Set `mismatch` (`None` disables partial matching).
	///
	/// # Errors
	/// Returns `InvalidParameter` if `mismatch < 0`.
	pub fn set_mismatch(&mut self, mismatch: Option<f64>) -> Result<()> {
		let mut p = self.params.clone();
		p.mismatch = mismatch;
		self.set_params(p)
	}

	/// Set `threshold` (`None` disables the activation floor).
	pub fn set_threshold(&mut self, threshold: Option<f64>) {
		self.params.threshold = threshold;
	}

	/// Set `optimized_learning`.
	///
	/// # Errors
	/// Returns `InvalidParameter` if `On`/`Fixed` is combined with a decay
	/// of `>= 1`.
	pub fn set_optimized_learning(&mut self, mode: OptimizedLearning) -> Result<()> {
		let mut p = self.params.clone();
		p.optimized_learning = mode;
		self.set_params(p)
	}

	/// Switch similarity scale between natural `[0,1]` and ACT-R `[-1,0]`.
	pub fn set_use_actr_similarity(&mut self, enabled: bool) {
		self.params.use_actr_similarity = enabled;
		self.registry.set_use_actr_similarity(enabled);
	}

	/// Declare (or clear) the secondary index.
	pub fn set_index(&mut self, index: Option<Vec<String>>) {
		if index != self.params.index {
			self.store.set_index(index.clone());
		}
		self.params.index = index;
	}

	// -- noise ------------------------------------------------------------

	fn sample_noise(&mut self, chunk_id: ChunkId) -> f64 {
		let sigma = self.params.noise;
		if self.fixed_noise_active {
			let key = (chunk_id, self.current_time.to_bits());
			if let Some(&cached) = self.noise_cache.get(&key) {
				return cached;
			}
			let sample = self.rng.logistic_noise(sigma);
			self.noise_cache.insert(key, sample);
			sample
		} else {
			self.rng.logistic_noise(sigma)
		}
	}

	/// Enter fixed-noise mode: any activation of a given chunk at a given
	/// time reuses the same noise sample until the guard is dropped.
	pub fn fixed_noise(&mut self) -> FixedNoiseGuard<'_> {
		let previous = self.fixed_noise_active;
		self.fixed_noise_active = true;
		FixedNoiseGuard { memory: self, previous }
	}

	// -- activation history -----------------------------------------------

	/// The recorded trace, in call order.
	#[must_use]
	pub fn activation_history(&self) -> &[ActivationRecord] {
		self.history.records()
	}

	/// Enable or disable history recording without clearing existing records.
	pub fn set_activation_history_enabled(&mut self, enabled: bool) {
		self.history.set_enabled(enabled);
	}

	/// Clear recorded history.
	pub fn clear_activation_history(&mut self) {
		self.history.clear();
	}

	/// Enter history-recording mode for the scope of the guard.
	pub fn record_history(&mut self) -> HistoryGuard<'_> {
		let previous = self.history.is_enabled();
		self.history.set_enabled(true);
		HistoryGuard { memory: self, previous }
	}

	fn passes_threshold(&self, total: f64) -> bool {
		self.params.threshold.map_or(true, |th| total >= th)
	}

	fn effective_temperature(&self) -> Result<f64> {
		let tau = self
			.params
			.temperature
			.unwrap_or_else(|| default_temperature(self.params.noise));
		if tau <= 0.0 {
			return Err(MemoryError::InvalidParameter {
				parameter: "temperature",
				reason: "auto-derived temperature (sigma*sqrt(2)) is 0 because noise is 0; set an explicit temperature".to_string(),
			});
		}
		Ok(tau)
	}

	fn activate_candidates<'c>(&mut self, candidates: &'c [EligibleCandidate]) -> Vec<ComputedActivation<'c>> {
		candidates
			.iter()
			.map(|candidate| {
				let base_level = base_level_activation(
					&candidate.reinforcements,
					self.current_time,
					self.params.decay,
					self.params.optimized_learning,
					self.params.zero_age_policy,
				);
				let noise = self.sample_noise(candidate.chunk_id);
				let total = total_activation(base_level, noise, candidate.partial_match.penalty);
				ComputedActivation {
					candidate,
					base_level,
					noise,
					total,
				}
			})
			.collect()
	}

	fn record_of(computed: &ComputedActivation<'_>, eligible: bool, retrieval_probability: Option<f64>) -> ActivationRecord {
		ActivationRecord {
			chunk_id: computed.candidate.chunk_id,
			attributes: computed.candidate.attributes.clone(),
			reinforcements: computed.candidate.reinforcements.clone(),
			base_level: computed.base_level,
			noise: computed.noise,
			mismatch: computed.candidate.partial_match.penalty,
			total_activation: computed.total,
			retrieval_probability,
			eligible,
		}
	}

	// -- retrieval ----------------------------------------------------------

	/// Retrieve the chunk with the highest activation above threshold.
	/// Ties are broken uniformly at random. If `rehearse`, the chosen chunk
	/// is reinforced at `current_time`.
	pub fn retrieve(&mut self, probe: &AttributeMap, rehearse: bool) -> Result<Option<Chunk>> {
		let candidates = eligible_candidates(&self.store, &self.registry, probe, self.params.mismatch)?;
		if candidates.is_empty() {
			return Ok(None);
		}

		let computed = self.activate_candidates(&candidates);
		let records: Vec<ActivationRecord> = computed
			.iter()
			.map(|c| Self::record_of(c, self.passes_threshold(c.total), None))
			.collect();
		self.history.extend(records);

		let keep: Vec<usize> = (0..computed.len())
			.filter(|&i| self.passes_threshold(computed[i].total))
			.collect();
		if keep.is_empty() {
			return Ok(None);
		}

		let kept_totals: Vec<f64> = keep.iter().map(|&i| computed[i].total).collect();
		let Some(local) = argmax_with_ties(&kept_totals, &mut self.rng) else {
			return Ok(None);
		};
		let winner = &computed[keep[local]].candidate;
		let chunk = Chunk {
			id: winner.chunk_id,
			attributes: winner.attributes.clone(),
			created_at: winner.creation_time,
			reinforcements: winner.reinforcements.clone(),
		};

		if rehearse {
			self.store.learn(chunk.attributes.clone(), self.current_time);
		}

		Ok(Some(chunk))
	}

	/// Blend `output_attribute` over chunks matching `probe`, returning the
	/// probability-weighted average, or `None` if no candidate clears
	/// threshold.
	///
	/// # Errors
	///
	/// `UnknownAttribute` if no eligible candidate has `output_attribute`.
	/// `NonNumericBlend` if some eligible candidate's value is non-numeric.
	/// `InvalidParameter` if the effective temperature is not positive.
	pub fn blend(&mut self, output_attribute: &str, probe: &AttributeMap) -> Result<Option<f64>> {
		let candidates = eligible_candidates(&self.store, &self.registry, probe, self.params.mismatch)?;
		if candidates.is_empty() {
			self.last_blend_trace = None;
			return Ok(None);
		}

		let mut any_present = false;
		for c in &candidates {
			if let Some(v) = c.attributes.get(output_attribute) {
				any_present = true;
				if !v.is_numeric() {
					return Err(MemoryError::NonNumericBlend {
						attribute: output_attribute.to_string(),
						value: v.clone(),
					});
				}
			}
		}
		if !any_present {
			return Err(MemoryError::UnknownAttribute {
				attribute: output_attribute.to_string(),
			});
		}

		let temperature = self.effective_temperature()?;
		let computed = self.activate_candidates(&candidates);

		let usable: Vec<usize> = (0..computed.len())
			.filter(|&i| computed[i].candidate.attributes.contains_key(output_attribute))
			.collect();

		let mut records: Vec<ActivationRecord> = computed
			.iter()
			.enumerate()
			.map(|(i, c)| Self::record_of(c, usable.contains(&i) && self.passes_threshold(c.total), None))
			.collect();

		let keep: Vec<usize> = usable
			.iter()
			.copied()
			.filter(|&i| self.passes_threshold(computed[i].total))
			.collect();

		if keep.is_empty() {
			self.history.extend(records);
			self.last_blend_trace = None;
			return Ok(None);
		}

		let kept_totals: Vec<f64> = keep.iter().map(|&i| computed[i].total).collect();
		let kept_values: Vec<f64> = keep
			.iter()
			.map(|&i| {
				computed[i]
					.candidate
					.attributes
					.get(output_attribute)
					.and_then(Value::as_f64)
					.unwrap_or(0.0)
			})
			.collect();
		let weights = softmax_weights(&kept_totals, temperature);
		let (bv, probabilities) = blend_values(&kept_values, &weights);

		for (pos, &i) in keep.iter().enumerate() {
			records[i].retrieval_probability = Some(probabilities[pos]);
		}
		self.history.extend(records);

		self.last_blend_trace = if self.history.is_enabled() {
			Some(BlendTrace {
				candidates: keep
					.iter()
					.enumerate()
					.map(|(pos, &i)| BlendTraceEntry {
						attributes: computed[i].candidate.attributes.clone(),
						value: kept_values[pos],
						probability: probabilities[pos],
					})
					.collect(),
			})
		} else {
			None
		};

		Ok(Some(bv))
	}

	/// Enumerate the distinct values of `output_attribute` among filtered
	/// candidates and return the one whose sub-cohort achieves the maximum
	/// blended (probability-weighted) activation.
	///
	/// # Errors
	///
	/// `UnknownAttribute` if no eligible candidate has `output_attribute`.
	/// `InvalidParameter` if the effective temperature is not positive.
	pub fn discrete_blend(&mut self, output_attribute: &str, probe: &AttributeMap) -> Result<Option<Value>> {
		let candidates = eligible_candidates(&self.store, &self.registry, probe, self.params.mismatch)?;
		if candidates.is_empty() {
			return Ok(None);
		}

		let any_present = candidates.iter().any(|c| c.attributes.contains_key(output_attribute));
		if !any_present {
			return Err(MemoryError::UnknownAttribute {
				attribute: output_attribute.to_string(),
			});
		}

		let temperature = self.effective_temperature()?;
		let computed = self.activate_candidates(&candidates);

		let usable: Vec<usize> = (0..computed.len())
			.filter(|&i| computed[i].candidate.attributes.contains_key(output_attribute))
			.collect();

		let mut records: Vec<ActivationRecord> = computed
			.iter()
			.enumerate()
			.map(|(i, c)| Self::record_of(c, usable.contains(&i) && self.passes_threshold(c.total), None))
			.collect();

		let keep: Vec<usize> = usable
			.iter()
			.copied()
			.filter(|&i| self.passes_threshold(computed[i].total))
			.collect();

		if keep.is_empty() {
			self.history.extend(records);
			return Ok(None);
		}

		let kept_totals: Vec<f64> = keep.iter().map(|&i| computed[i].total).collect();
		let weights = softmax_weights(&kept_totals, temperature);
		let total_weight: f64 = weights.iter().sum();
		#[allow(clippy::cast_precision_loss)]
		let probabilities: Vec<f64> = if total_weight == 0.0 {
			vec![1.0 / weights.len() as f64; weights.len()]
		} else {
			weights.iter().map(|w| w / total_weight).collect()
		};

		for (pos, &i) in keep.iter().enumerate() {
			records[i].retrieval_probability = Some(probabilities[pos]);
		}
		self.history.extend(records);

		let mut mass: HashMap<Value, f64> = HashMap::new();
		for (pos, &i) in keep.iter().enumerate() {
			let Some(value) = computed[i].candidate.attributes.get(output_attribute) else {
				continue;
			};
			*mass.entry(value.clone()).or_insert(0.0) += probabilities[pos];
		}

		let mut groups: Vec<(Value, f64)> = mass.into_iter().collect();
		groups.sort_by(|a, b| a.0.cmp(&b.0));
		let max = groups.iter().map(|(_, m)| *m).fold(f64::NEG_INFINITY, f64::max);
		let tied: Vec<usize> = groups
			.iter()
			.enumerate()
			.filter(|(_, (_, m))| *m == max)
			.map(|(i, _)| i)
			.collect();
		let choice = tied[self.rng.choose_index(tied.len())];

		Ok(Some(groups[choice].0.clone()))
	}

	/// For each of `choices`, blend `output_attribute` over candidates whose
	/// `choice_attribute` equals that choice (merged with `probe`), and
	/// return the choice achieving the largest blended value. Choices with
	/// no eligible candidates are skipped; ties broken uniformly at random.
	///
	/// # Errors
	///
	/// Propagates `NonNumericBlend`/`InvalidParameter` from the underlying
	/// per-choice blends. A per-choice `UnknownAttribute` (the output
	/// attribute is absent for that particular choice) is treated as "no
	/// eligible candidates" and the choice is skipped.
	pub fn best_blend(
		&mut self,
		output_attribute: &str,
		choices: &[Value],
		choice_attribute: &str,
		probe: &AttributeMap,
	) -> Result<Option<(Value, f64)>> {
		let mut results: Vec<(Value, f64)> = Vec::new();
		for choice in choices {
			let mut merged = probe.clone();
			merged.insert(choice_attribute.to_string(), choice.clone());
			match self.blend(output_attribute, &merged) {
				Ok(Some(bv)) => results.push((choice.clone(), bv)),
				Ok(None) | Err(MemoryError::UnknownAttribute { .. }) => {}
				Err(other) => return Err(other),
			}
		}

		if results.is_empty() {
			return Ok(None);
		}

		let max = results.iter().map(|(_, bv)| *bv).fold(f64::NEG_INFINITY, f64::max);
		let tied: Vec<usize> = results
			.iter()
			.enumerate()
			.filter(|(_, (_, bv))| *bv == max)
			.map(|(i, _)| i)
			.collect();
		let idx = tied[self.rng.choose_index(tied.len())];
		Ok(Some(results[idx].clone()))
	}

	// -- salience -------------------------------------------------------

	/// Compute `salience(attribute, target)` from the trace of the most
	/// recent blend.
	///
	/// # Errors
	///
	/// `InvalidParameter` if no blend trace was recorded (either no blend
	/// has run, or activation history was disabled during it).
	/// `UnknownAttribute` if no derivative is registered for `attribute`.
	/// `UndefinedDerivative` if the configured policy is `Error` and some
	/// traced candidate's value equals `target`.
	pub fn salience(&self, attribute: &str, target: impl Into<Value>) -> Result<f64> {
		let Some(trace) = &self.last_blend_trace else {
			return Err(MemoryError::InvalidParameter {
				parameter: "activation_history",
				reason: "salience requires a preceding blend recorded with activation history enabled".to_string(),
			});
		};
		salience::salience(
			trace,
			&self.registry,
			attribute,
			&target.into(),
			self.params.mismatch,
			self.params.derivative_undefined_policy,
		)
	}
}

impl Default for Memory {
	/// Builds directly from [`MemoryParameters::default`] rather than going
	/// through [`Memory::new`], since that default is a fixed literal with
	/// no way to fail `validate`.
	fn default() -> Self {
		let params = MemoryParameters::default();
		let mut registry = SimilarityRegistry::new();
		registry.set_use_actr_similarity(params.use_actr_similarity);
		let mut store = ChunkStore::new();
		store.set_index(params.index.clone());
		let rng = match params.seed {
			Some(seed) => MemoryRng::from_seed(seed),
			None => MemoryRng::from_entropy(),
		};
		Self {
			store,
			registry,
			rng,
			history: ActivationHistory::default(),
			last_blend_trace: None,
			noise_cache: HashMap::new(),
			fixed_noise_active: false,
			current_time: 0.0,
			params,
		}
	}
}
