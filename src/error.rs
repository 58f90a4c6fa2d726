//! Error kinds surfaced by the memory engine.
//!
//! Every fallible public operation returns `Result<T, MemoryError>`. Failures
//! that are a normal part of retrieval semantics — no eligible candidates, or
//! every candidate below threshold — are not errors; `retrieve`/`blend` return
//! `Ok(None)` for those. `MemoryError` is reserved for misuse: parameters out
//! of domain, time moving backward, or probing an attribute the memory has
//! never seen.

use crate::value::Value;

/// Failure modes of the declarative memory engine.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
	/// A parameter was set to a value outside its domain.
	#[error("invalid parameter `{parameter}`: {reason}")]
	InvalidParameter {
		/// Name of the offending parameter.
		parameter: &'static str,
		/// Human-readable explanation.
		reason: String,
	},

	/// `advance` was called with a negative delta, or a reinforcement time
	/// falls after `current_time`.
	#[error("invalid time: {reason}")]
	InvalidTime {
		/// Human-readable explanation.
		reason: String,
	},

	/// `blend`/`discrete_blend`/`salience` was asked about an attribute that
	/// is absent from every eligible candidate.
	#[error("attribute `{attribute}` is not present on any eligible chunk")]
	UnknownAttribute {
		/// The attribute name that was probed.
		attribute: String,
	},

	/// `blend`'s output attribute holds a non-numeric value on at least one
	/// otherwise-eligible candidate.
	#[error("attribute `{attribute}` has a non-numeric value ({value:?}) and cannot be blended")]
	NonNumericBlend {
		/// The attribute name that was probed.
		attribute: String,
		/// The offending value.
		value: Value,
	},

	/// `salience` was probed at a point where the derivative function is
	/// undefined (probe value equals the chunk's value) and the configured
	/// policy is `Error`.
	#[error(
		"derivative for attribute `{attribute}` is undefined at x=y={value:?} and no fallback policy is configured"
	)]
	UndefinedDerivative {
		/// The attribute name that was probed.
		attribute: String,
		/// The shared value at which x == y.
		value: Value,
	},

	/// A user-supplied similarity function returned an out-of-range or
	/// asymmetric value.
	#[error("similarity function for attribute `{attribute}` violated its contract: {reason}")]
	SimilarityContract {
		/// The attribute name whose similarity function misbehaved.
		attribute: String,
		/// Human-readable explanation.
		reason: String,
	},
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MemoryError>;
