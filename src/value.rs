//! Chunk attribute values.
//!
//! Attributes are heterogeneous scalars: numbers, text, booleans, or symbols
//! (interned-style atoms used for categorical/choice attributes). The variant
//! is total, deterministic equality and hashing, which is what lets the chunk
//! store use attribute-tuples as content-addressed keys.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single chunk attribute value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
	/// A real number. Hashed/compared by bit pattern via `OrderedFloat`, so
	/// `Value::Number` participates in the content-addressed chunk key.
	Number(OrderedFloat<f64>),
	/// Free text.
	Text(String),
	/// A boolean flag.
	Bool(bool),
	/// A categorical atom, e.g. a choice label (`"rock"`, `"safe"`).
	Symbol(String),
}

impl Value {
	/// Build a numeric value.
	#[must_use]
	pub fn number(n: f64) -> Self {
		Value::Number(OrderedFloat(n))
	}

	/// Build a symbolic (categorical) value.
	#[must_use]
	pub fn symbol(s: impl Into<String>) -> Self {
		Value::Symbol(s.into())
	}

	/// Build a text value.
	#[must_use]
	pub fn text(s: impl Into<String>) -> Self {
		Value::Text(s.into())
	}

	/// This value as `f64`, if it is numeric.
	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Number(n) => Some(n.0),
			_ => None,
		}
	}

	/// Whether this value is numeric.
	#[must_use]
	pub fn is_numeric(&self) -> bool {
		matches!(self, Value::Number(_))
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Number(n) => write!(f, "{}", n.0),
			Value::Text(s) | Value::Symbol(s) => write!(f, "{s}"),
			Value::Bool(b) => write!(f, "{b}"),
		}
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::number(n)
	}
}

impl From<i64> for Value {
	#[allow(clippy::cast_precision_loss)]
	fn from(n: i64) -> Self {
		Value::number(n as f64)
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::symbol(s)
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Symbol(s)
	}
}
