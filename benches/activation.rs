//! Benchmarks for activation computation, exercised through the public
//! learn/retrieve surface (the activation formulas themselves are private).
//!
//! Tests performance of:
//! - Base-level activation over growing reinforcement histories
//! - Partial-match filtering with a similarity function registered

#![allow(clippy::expect_used)] // Fine in benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use declarative_memory::{AttributeMap, Memory, MemoryParameters, Value};
use rand::Rng;
use std::sync::Arc;

fn reinforced_memory(reinforcements: usize) -> (Memory, AttributeMap) {
	let mut memory = Memory::new(MemoryParameters {
		decay: Some(0.5),
		..Default::default()
	})
	.expect("valid parameters");

	let mut chunk = AttributeMap::new();
	chunk.insert("kind".to_string(), Value::symbol("widget"));

	for _ in 0..reinforcements {
		memory.learn(chunk.clone(), 1.0).expect("valid advance");
	}

	(memory, chunk)
}

fn bench_base_level_growth(c: &mut Criterion) {
	let mut group = c.benchmark_group("base_level_activation");

	for reinforcements in &[5, 10, 20, 50, 100] {
		let (mut memory, probe) = reinforced_memory(*reinforcements);

		let _ = group.bench_with_input(
			BenchmarkId::new("reinforcements", reinforcements),
			reinforcements,
			|bench, _| {
				bench.iter(|| memory.retrieve(black_box(&probe), false));
			},
		);
	}

	group.finish();
}

fn bench_partial_match_filtering(c: &mut Criterion) {
	let mut group = c.benchmark_group("partial_match_filtering");

	for chunk_count in &[100_i32, 500, 1000, 2000] {
		let mut memory = Memory::new(MemoryParameters {
			decay: Some(0.5),
			mismatch: Some(1.0),
			..Default::default()
		})
		.expect("valid parameters");
		memory
			.similarity_fn(
				"value",
				Arc::new(|a: &Value, b: &Value| 1.0 - (a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)).abs() / 100.0),
				1.0,
			)
			.expect("valid weight");

		let mut rng = rand::thread_rng();
		for _ in 0..*chunk_count {
			let mut chunk = AttributeMap::new();
			chunk.insert("value".to_string(), Value::number(rng.gen_range(0.0..100.0)));
			memory.learn(chunk, 1.0).expect("valid advance");
		}

		let mut probe = AttributeMap::new();
		probe.insert("value".to_string(), Value::number(50.0));

		#[allow(clippy::cast_sign_loss)]
		let throughput = *chunk_count as u64;
		let _ = group.throughput(Throughput::Elements(throughput));
		let _ = group.bench_with_input(BenchmarkId::new("chunks", chunk_count), chunk_count, |bench, _| {
			bench.iter(|| memory.retrieve(black_box(&probe), false));
		});
	}

	group.finish();
}

criterion_group!(benches, bench_base_level_growth, bench_partial_match_filtering);
criterion_main!(benches);
