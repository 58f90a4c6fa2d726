//! Safe/Risky Choice via instance-based learning
//!
//! Prepopulate memory with one "safe" experience worth 1 and two "risky"
//! experiences worth 0 and 2 (same expected value, higher variance). Each
//! simulated participant repeatedly asks `best_blend` which choice has the
//! higher blended outcome, reinforcing whichever it picks with the outcome
//! it "experiences" that round. Across many participants the risky choice's
//! blended value is pulled down by its zero outcomes more often than it is
//! pulled up by its twos, so the population drifts toward the safe choice:
//! the instance-based account of risk aversion.
//!
//! Run with: `cargo run --example safe_risky_ibl`

use declarative_memory::{AttributeMap, Memory, MemoryParameters, Value};
use rand::Rng;

fn outcome_chunk(choice: &str, outcome: f64) -> AttributeMap {
	let mut map = AttributeMap::new();
	map.insert("choice".to_string(), Value::symbol(choice));
	map.insert("outcome".to_string(), Value::number(outcome));
	map
}

/// Sample this round's risky outcome: 0 or 2, each with probability 1/2.
fn risky_outcome(rng: &mut impl Rng) -> f64 {
	if rng.gen_bool(0.5) {
		0.0
	} else {
		2.0
	}
}

fn run_participant(seed: u64, rounds: usize) -> usize {
	let mut memory = Memory::new(MemoryParameters {
		noise: 0.25,
		decay: Some(0.5),
		temperature: Some(1.0),
		seed: Some(seed),
		..Default::default()
	})
	.expect("valid parameters");

	for (choice, outcome) in [("safe", 1.0), ("risky", 0.0), ("risky", 2.0)] {
		memory.learn(outcome_chunk(choice, outcome), 1.0).expect("valid advance");
	}

	let choices = [Value::symbol("safe"), Value::symbol("risky")];
	let probe = AttributeMap::new();
	let mut rng = rand::thread_rng();
	let mut risky_picks = 0;

	for _ in 0..rounds {
		let (choice, _) = memory
			.best_blend("outcome", &choices, "choice", &probe)
			.expect("outcome is numeric on every learned chunk")
			.expect("at least one prepopulated choice is always eligible");

		let picked_risky = choice == Value::symbol("risky");
		if picked_risky {
			risky_picks += 1;
		}

		let outcome = if picked_risky { risky_outcome(&mut rng) } else { 1.0 };
		let label = if picked_risky { "risky" } else { "safe" };
		memory.learn(outcome_chunk(label, outcome), 1.0).expect("valid advance");
	}

	risky_picks
}

fn main() {
	println!("=== Safe/Risky Instance-Based Learning ===\n");

	let participants = 10_000;
	let rounds_per_participant = 20;
	let mut total_risky_picks = 0_u64;

	for p in 0..participants {
		let seed = p as u64 + 1;
		total_risky_picks += run_participant(seed, rounds_per_participant) as u64;
	}

	#[allow(clippy::cast_precision_loss)]
	let average_risky_fraction =
		total_risky_picks as f64 / (participants * rounds_per_participant) as f64;
	println!(
		"average fraction of risky choices across {participants} participants, {rounds_per_participant} rounds each: {average_risky_fraction:.4}"
	);
	println!("(expect a steady-state well below 0.5, reflecting risk aversion)");
}
