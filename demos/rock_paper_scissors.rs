//! Rock-Paper-Scissors via instance-based learning
//!
//! Each agent remembers (move, reward) experiences and picks the move whose
//! blended reward is highest, falling back to a random legal move until it
//! has learned anything at all.
//!
//! Run with: `cargo run --example rock_paper_scissors`

use declarative_memory::{AttributeMap, Memory, MemoryParameters, Value};
use rand::Rng;

const MOVES: [&str; 3] = ["rock", "paper", "scissors"];

fn beats(a: &str, b: &str) -> bool {
	matches!((a, b), ("rock", "scissors") | ("paper", "rock") | ("scissors", "paper"))
}

struct Agent {
	memory: Memory,
}

impl Agent {
	fn new(seed: u64) -> Self {
		Self {
			memory: Memory::new(MemoryParameters {
				noise: 0.1,
				decay: Some(0.5),
				temperature: Some(1.0),
				seed: Some(seed),
				..Default::default()
			})
			.expect("valid parameters"),
		}
	}

	fn choose(&mut self, rng: &mut impl Rng) -> &'static str {
		let choices: Vec<Value> = MOVES.iter().map(|m| Value::symbol(*m)).collect();
		let probe = AttributeMap::new();
		match self
			.memory
			.best_blend("reward", &choices, "move", &probe)
			.expect("reward is numeric on every learned chunk")
		{
			Some((choice, _)) => MOVES
				.iter()
				.find(|m| Value::symbol(*m) == choice)
				.copied()
				.unwrap_or(MOVES[0]),
			None => MOVES[rng.gen_range(0..MOVES.len())],
		}
	}

	fn learn_outcome(&mut self, my_move: &str, reward: f64) {
		let mut chunk = AttributeMap::new();
		chunk.insert("move".to_string(), Value::symbol(my_move));
		chunk.insert("reward".to_string(), Value::number(reward));
		self.memory.learn(chunk, 1.0).expect("valid advance");
	}
}

fn main() {
	println!("=== Rock-Paper-Scissors (instance-based agents) ===\n");

	let mut rng = rand::thread_rng();
	let mut agent_a = Agent::new(1);
	let mut agent_b = Agent::new(2);
	let mut score_a = 0_i32;

	for round in 1..=100 {
		let move_a = agent_a.choose(&mut rng);
		let move_b = agent_b.choose(&mut rng);

		let (reward_a, reward_b) = if move_a == move_b {
			(0.0, 0.0)
		} else if beats(move_a, move_b) {
			score_a += 1;
			(1.0, -1.0)
		} else {
			score_a -= 1;
			(-1.0, 1.0)
		};

		agent_a.learn_outcome(move_a, reward_a);
		agent_b.learn_outcome(move_b, reward_b);

		if round % 20 == 0 {
			println!("round {round}: A={move_a} B={move_b} score_a={score_a}");
		}
	}

	println!("\nfinal score (agent A perspective): {score_a}");
}
