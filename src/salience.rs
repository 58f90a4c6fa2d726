//! Salience: the partial derivative of a blended value with respect to a
//! probe attribute, computed from the trace of the most recent blend.
//!
//! `salience(a, y) = Σ_i p_i · v_i · (d_i − Σ_j p_j · d_j)`
//! `d_i = (∂ξ_a/∂x)(chunk_i.a, y) · μ · ω_a`

use crate::chunk::AttributeMap;
use crate::error::{MemoryError, Result};
use crate::similarity::SimilarityRegistry;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A small perturbation used to approximate one-sided derivatives at the
/// point where the derivative function is undefined (`x == y`).
const DERIVATIVE_EPS: f64 = 1e-6;

/// Policy for resolving a derivative at `x == y`, where the user-supplied
/// derivative function is, by definition, undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DerivativeUndefinedPolicy {
	/// Treat the undefined derivative as zero (no local influence).
	#[default]
	Zero,
	/// Use the one-sided derivative approached from below `y`.
	OneSided,
	/// Average the one-sided derivatives approached from both sides.
	Average,
	/// Fail the salience call with `MemoryError::UndefinedDerivative`.
	Error,
}

/// One candidate's contribution to the most recent blend, retained for
/// salience computation. Recording this implies the activation history
/// recorder was active during that blend.
#[derive(Debug, Clone)]
pub struct BlendTraceEntry {
	/// The candidate chunk's attributes, as they were at blend time.
	pub attributes: AttributeMap,
	/// `s_i`, the candidate's value of the blended output attribute.
	pub value: f64,
	/// `p_i`, the candidate's retrieval probability within the blend.
	pub probability: f64,
}

/// Trace of the most recent `blend`/`discrete_blend` call, consumed by
/// `salience`.
#[derive(Debug, Clone, Default)]
pub struct BlendTrace {
	/// Per-candidate entries, in the blend's candidate-enumeration order.
	pub candidates: Vec<BlendTraceEntry>,
}

fn nudged(value: &Value, delta: f64) -> Option<Value> {
	value.as_f64().map(|v| Value::number(v + delta))
}

fn resolve_derivative(
	registry: &SimilarityRegistry,
	attribute: &str,
	chunk_value: &Value,
	target: &Value,
	policy: DerivativeUndefinedPolicy,
) -> Result<f64> {
	if chunk_value != target {
		return Ok(registry.derivative(attribute, chunk_value, target).unwrap_or(0.0));
	}

	match policy {
		DerivativeUndefinedPolicy::Zero => Ok(0.0),
		DerivativeUndefinedPolicy::Error => Err(MemoryError::UndefinedDerivative {
			attribute: attribute.to_string(),
			value: target.clone(),
		}),
		DerivativeUndefinedPolicy::OneSided => {
			let Some(left) = nudged(target, -DERIVATIVE_EPS) else {
				return Ok(0.0);
			};
			Ok(registry.derivative(attribute, &left, target).unwrap_or(0.0))
		}
		DerivativeUndefinedPolicy::Average => {
			let (Some(left), Some(right)) = (nudged(target, -DERIVATIVE_EPS), nudged(target, DERIVATIVE_EPS)) else {
				return Ok(0.0);
			};
			let dl = registry.derivative(attribute, &left, target).unwrap_or(0.0);
			let dr = registry.derivative(attribute, &right, target).unwrap_or(0.0);
			Ok((dl + dr) / 2.0)
		}
	}
}

/// Compute `salience(attribute, target)` from a recorded blend trace.
///
/// # Errors
///
/// Returns `UnknownAttribute` if no derivative function is registered for
/// `attribute`, or if a traced candidate lacks that attribute entirely.
/// Returns `UndefinedDerivative` if the policy is `Error` and some candidate's
/// value equals `target`.
pub fn salience(
	trace: &BlendTrace,
	registry: &SimilarityRegistry,
	attribute: &str,
	target: &Value,
	mismatch: Option<f64>,
	policy: DerivativeUndefinedPolicy,
) -> Result<f64> {
	if !registry.has_derivative(attribute) {
		return Err(MemoryError::UnknownAttribute {
			attribute: attribute.to_string(),
		});
	}

	// Disabled mismatch means partial matching never contributes, so the
	// derivative-weighted influence of this attribute is uniformly zero.
	let mu = mismatch.unwrap_or(0.0);
	let weight = registry.weight(attribute);

	let mut d_values = Vec::with_capacity(trace.candidates.len());
	for entry in &trace.candidates {
		let chunk_value = entry
			.attributes
			.get(attribute)
			.ok_or_else(|| MemoryError::UnknownAttribute {
				attribute: attribute.to_string(),
			})?;
		let raw = resolve_derivative(registry, attribute, chunk_value, target, policy)?;
		d_values.push(raw * mu * weight);
	}

	let weighted_mean_d: f64 = trace
		.candidates
		.iter()
		.zip(&d_values)
		.map(|(e, d)| e.probability * d)
		.sum();

	let result = trace
		.candidates
		.iter()
		.zip(&d_values)
		.map(|(e, d)| e.probability * e.value * (d - weighted_mean_d))
		.sum();

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;

	fn attrs(pairs: &[(&str, Value)]) -> AttributeMap {
		pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
	}

	fn registry_with_linear(attribute: &str) -> SimilarityRegistry {
		let mut reg = SimilarityRegistry::new();
		reg.set_custom(
			attribute,
			Arc::new(|a: &Value, b: &Value| 1.0 - (a.as_f64().unwrap() - b.as_f64().unwrap()).abs() / 16.0),
			1.0,
		);
		reg.set_derivative(
			attribute,
			Arc::new(|x: &Value, y: &Value| {
				let (x, y) = (x.as_f64().unwrap(), y.as_f64().unwrap());
				if x > y {
					-1.0 / 16.0
				} else {
					1.0 / 16.0
				}
			}),
		);
		reg
	}

	#[test]
	fn unregistered_derivative_is_unknown_attribute() {
		let reg = SimilarityRegistry::new();
		let trace = BlendTrace::default();
		let err = salience(&trace, &reg, "r", &Value::number(2.0), Some(1.0), DerivativeUndefinedPolicy::Zero);
		assert!(matches!(err, Err(MemoryError::UnknownAttribute { .. })));
	}

	#[test]
	fn salience_is_zero_when_all_candidates_match_target_under_zero_policy() {
		let reg = registry_with_linear("r");
		let trace = BlendTrace {
			candidates: vec![
				BlendTraceEntry {
					attributes: attrs(&[("r", Value::number(2.0))]),
					value: 5.0,
					probability: 0.5,
				},
				BlendTraceEntry {
					attributes: attrs(&[("r", Value::number(2.0))]),
					value: 7.0,
					probability: 0.5,
				},
			],
		};
		let s = salience(&trace, &reg, "r", &Value::number(2.0), Some(1.0), DerivativeUndefinedPolicy::Zero).unwrap();
		assert!((s - 0.0).abs() < 1e-9);
	}

	#[test]
	fn error_policy_surfaces_undefined_derivative() {
		let reg = registry_with_linear("r");
		let trace = BlendTrace {
			candidates: vec![BlendTraceEntry {
				attributes: attrs(&[("r", Value::number(2.0))]),
				value: 5.0,
				probability: 1.0,
			}],
		};
		let err = salience(&trace, &reg, "r", &Value::number(2.0), Some(1.0), DerivativeUndefinedPolicy::Error);
		assert!(matches!(err, Err(MemoryError::UndefinedDerivative { .. })));
	}

	#[test]
	fn nonzero_salience_when_values_differ_from_target() {
		let reg = registry_with_linear("r");
		let trace = BlendTrace {
			candidates: vec![
				BlendTraceEntry {
					attributes: attrs(&[("r", Value::number(1.0))]),
					value: 1.0,
					probability: 0.5,
				},
				BlendTraceEntry {
					attributes: attrs(&[("r", Value::number(3.0))]),
					value: 9.0,
					probability: 0.5,
				},
			],
		};
		let s = salience(&trace, &reg, "r", &Value::number(2.0), Some(1.0), DerivativeUndefinedPolicy::Zero).unwrap();
		assert!(s.abs() > 1e-9);
	}
}
