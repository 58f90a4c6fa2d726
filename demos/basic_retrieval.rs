//! Basic Blend and Salience Example
//!
//! This example demonstrates the core blending pipeline:
//! 1. Learn a handful of (r, h, v) chunks, advancing time between each
//! 2. Register a similarity function on the probe attributes r and h
//! 3. Blend the v attribute against a probe and inspect the result
//! 4. Ask how sensitive that blend is to each probe attribute (salience)
//!
//! Run with: `cargo run --example basic_retrieval`

use declarative_memory::{AttributeMap, Memory, MemoryParameters, Value};
use std::sync::Arc;

fn chunk(r: f64, h: f64, v: f64) -> AttributeMap {
	let mut map = AttributeMap::new();
	map.insert("r".to_string(), Value::number(r));
	map.insert("h".to_string(), Value::number(h));
	map.insert("v".to_string(), Value::number(v));
	map
}

fn main() {
	println!("=== Basic Blend and Salience ===\n");

	let mut memory = Memory::new(MemoryParameters {
		noise: 0.0,
		decay: Some(0.5),
		mismatch: Some(1.0),
		temperature: Some(1.0),
		..Default::default()
	})
	.expect("valid parameters");

	// ξ(x, y) = 1 − √(|x−y| / 16), with its derivative d/dx ξ.
	let similarity = Arc::new(|x: &Value, y: &Value| {
		let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
		1.0 - ((x - y).abs() / 16.0).sqrt()
	});
	let derivative = Arc::new(|x: &Value, y: &Value| {
		let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
		let diff = x - y;
		if diff == 0.0 {
			return 0.0;
		}
		-diff.signum() / (32.0 * (diff.abs() / 16.0).sqrt())
	});

	for attribute in ["r", "h"] {
		memory
			.similarity_fn(attribute, similarity.clone(), 1.0)
			.expect("valid weight");
		memory.derivative_fn(attribute, derivative.clone());
	}

	// Learn with activation history recording active for the upcoming blend,
	// so salience has a trace to work from.
	{
		let _recording = memory.record_history();

		for (r, h, v) in [
			(1.0, 1.0, 1.0),
			(3.0, 3.0, 27.0),
			(1.0, 3.0, 3.0),
			(1.0, 1.0, 1.0),
			(1.0, 1.0, 1.0),
			(3.0, 1.0, 9.0),
		] {
			memory.learn(chunk(r, h, v), 1.0).expect("valid advance");
		}

		let mut probe = AttributeMap::new();
		probe.insert("r".to_string(), Value::number(2.0));
		probe.insert("h".to_string(), Value::number(2.0));

		let bv = memory.blend("v", &probe).expect("numeric output attribute");
		println!("blend(v, {{r=2, h=2}}) = {bv:?}");

		for (attribute, target) in [("r", 2.0), ("h", 2.0)] {
			let s = memory
				.salience(attribute, target)
				.expect("derivative registered and trace recorded");
			println!("salience({attribute}, {target}) = {s:.5}");
		}
	}

	println!("\n{}", memory.print_chunks());
}
