use std::io::Write;

use clap::Parser;
use game2048::engine::{AiConfig, Weights};
use game2048::game::Game;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Parser)]
#[command(name = "simulate", about = "Compare evaluation weight variations over seeded games")]
struct Args {
    /// Games per variation (every variation sees the same seeds)
    #[arg(short, long, default_value_t = 10)]
    games: u64,

    /// Fixed search depth; the clock is effectively disabled so runs are reproducible
    #[arg(short, long, default_value_t = 2)]
    depth: u32,

    /// Board edge length
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Base seed; game i uses base + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Skip the combined-weights phase
    #[arg(long)]
    no_combine: bool,
}

#[derive(Debug, Clone, Copy)]
struct Summary {
    average_score: f64,
    reached_2048: f64,
    average_max_tile: f64,
}

fn play_game(config: &AiConfig, size: usize, seed: u64) -> (u64, u32) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut roll = move || rng.gen::<f64>();
    let mut game = Game::new_with(size, &mut roll);
    while game.step_ai_with(config, &mut roll).is_some() {}
    (game.score(), game.grid().max_tile().unwrap_or(0))
}

fn run_variation(label: &str, config: &AiConfig, args: &Args) -> Summary {
    let mut total_score = 0u64;
    let mut total_tile = 0u64;
    let mut wins = 0u64;
    for i in 0..args.games {
        let (score, tile) = play_game(config, args.size, args.seed + i);
        debug!("{label} game {i}: score {score}, max tile {tile}");
        total_score += score;
        total_tile += tile as u64;
        if tile >= 2048 {
            wins += 1;
        }
    }
    let n = args.games.max(1) as f64;
    Summary {
        average_score: total_score as f64 / n,
        reached_2048: 100.0 * wins as f64 / n,
        average_max_tile: total_tile as f64 / n,
    }
}

fn base_config(depth: u32) -> AiConfig {
    AiConfig {
        time_limit_ms: f64::MAX,
        max_depth: depth,
        ..AiConfig::new()
    }
}

fn make_config(depth: u32, f: impl FnOnce(&mut Weights)) -> AiConfig {
    let mut config = base_config(depth);
    f(&mut config.weights);
    config
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("=== 2048 AI Weight Comparison (depth {}) ===", args.depth);
    println!("Games per variation: {}, board {}x{}\n", args.games, args.size, args.size);

    let d = args.depth;
    let variations: Vec<(&str, AiConfig)> = vec![
        ("baseline", base_config(d)),
        // Empty cells
        ("empty=0.5", make_config(d, |w| w.empty = 0.5)),
        ("empty=2.0", make_config(d, |w| w.empty = 2.0)),
        ("empty=4.0", make_config(d, |w| w.empty = 4.0)),
        // Raw score
        ("score=0.0", make_config(d, |w| w.score = 0.0)),
        ("score=0.03", make_config(d, |w| w.score = 0.03)),
        ("score=0.15", make_config(d, |w| w.score = 0.15)),
        // Log score
        ("log_score=1.0", make_config(d, |w| w.log_score = 1.0)),
        ("log_score=5.0", make_config(d, |w| w.log_score = 5.0)),
        // Duplication
        ("dup=0.0", make_config(d, |w| w.duplication = 0.0)),
        ("dup=0.01", make_config(d, |w| w.duplication = 0.01)),
        ("dup=0.05", make_config(d, |w| w.duplication = 0.05)),
        // Neighbourhood
        ("nbhd=0.0", make_config(d, |w| w.neighborhood = 0.0)),
        ("nbhd=0.1", make_config(d, |w| w.neighborhood = 0.1)),
        ("nbhd=0.5", make_config(d, |w| w.neighborhood = 0.5)),
        ("nbhd=1.0", make_config(d, |w| w.neighborhood = 1.0)),
    ];

    // Phase 1: every variation on the same seeds
    println!("--- Phase 1: Each variation ---\n");
    let mut results: Vec<(&str, Summary)> = Vec::new();
    for (label, config) in &variations {
        print!("  Testing {label}... ");
        std::io::stdout().flush().ok();
        let summary = run_variation(label, config, &args);
        println!(
            "avg score {:.0}, avg max tile {:.0}, 2048 reached {:.0}%",
            summary.average_score, summary.average_max_tile, summary.reached_2048
        );
        results.push((label, summary));
    }

    let baseline_score = results
        .iter()
        .find(|(l, _)| *l == "baseline")
        .map(|(_, s)| s.average_score)
        .unwrap_or(0.0);

    let mut ranked = results.clone();
    ranked.sort_by(|a, b| b.1.average_score.total_cmp(&a.1.average_score));

    println!("\n--- Phase 1 Rankings (avg score vs baseline) ---\n");
    for (label, summary) in &ranked {
        let delta = summary.average_score - baseline_score;
        println!("  {delta:>+9.0}  {label}");
    }

    if args.no_combine {
        return;
    }

    // Phase 2: combine the best from each category
    println!("\n--- Phase 2: Combined best weights ---\n");

    let categories: [(&str, &[&str]); 5] = [
        ("empty", &["empty=0.5", "empty=2.0", "empty=4.0"]),
        ("score", &["score=0.0", "score=0.03", "score=0.15"]),
        ("log_score", &["log_score=1.0", "log_score=5.0"]),
        ("dup", &["dup=0.0", "dup=0.01", "dup=0.05"]),
        ("nbhd", &["nbhd=0.0", "nbhd=0.1", "nbhd=0.5", "nbhd=1.0"]),
    ];

    let mut combined = base_config(d);
    println!("  Best per category (vs baseline):");
    for (category, labels) in &categories {
        let mut best_label = "baseline";
        let mut best_score = baseline_score;
        for &label in labels.iter() {
            if let Some((_, s)) = results.iter().find(|(l, _)| *l == label) {
                if s.average_score > best_score {
                    best_score = s.average_score;
                    best_label = label;
                }
            }
        }
        println!("    {category:<10} {best_label}");
        if let Some((_, config)) = variations.iter().find(|(l, _)| *l == best_label) {
            let w = &config.weights;
            let c = &mut combined.weights;
            match *category {
                "empty" => c.empty = w.empty,
                "score" => c.score = w.score,
                "log_score" => c.log_score = w.log_score,
                "dup" => c.duplication = w.duplication,
                "nbhd" => c.neighborhood = w.neighborhood,
                _ => {}
            }
        }
    }

    let summary = run_variation("combined", &combined, &args);
    println!(
        "\n  combined: avg score {:.0} ({:+.0} vs baseline), 2048 reached {:.0}%",
        summary.average_score,
        summary.average_score - baseline_score,
        summary.reached_2048
    );
    match serde_json::to_string_pretty(&combined.weights) {
        Ok(json) => println!("\n  Weights:\n{json}"),
        Err(e) => eprintln!("cannot print weights: {e}"),
    }
}
