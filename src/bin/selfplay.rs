use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use game2048::board::{MAX_SIZE, MIN_SIZE};
use game2048::engine::AiConfig;
use game2048::game::Game;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Parser)]
#[command(name = "selfplay", about = "Let the AI play full games and report how they went")]
struct Args {
    /// Number of games to play
    #[arg(short, long, default_value_t = 1)]
    games: usize,

    /// Board edge length
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Search budget per move in milliseconds (overrides the config file)
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// JSON file holding an AiConfig; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for tile spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Print the board after every move
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    anyhow::ensure!(
        (MIN_SIZE..=MAX_SIZE).contains(&args.size),
        "board size must be between {MIN_SIZE} and {MAX_SIZE}, got {}",
        args.size
    );
    let mut config = match &args.config {
        Some(path) => AiConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => AiConfig::new(),
    };
    if let Some(ms) = args.time_limit {
        config.time_limit_ms = ms;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut roll = move || rng.gen::<f64>();

    let mut results: Vec<(u64, u32)> = Vec::with_capacity(args.games);
    for number in 1..=args.games {
        let mut game = Game::new_with(args.size, &mut roll);
        let mut moves = 0u64;
        let mut depth_sum = 0u64;

        while let Some((search, _)) = game.step_ai_with(&config, &mut roll) {
            moves += 1;
            depth_sum += search.depth as u64;
            if args.verbose {
                println!(
                    "{} (depth {}, value {:.2})",
                    search.direction, search.depth, search.evaluation
                );
                println!("{}", game.state());
            }
        }

        let max_tile = game.grid().max_tile().unwrap_or(0);
        let avg_depth = if moves > 0 { depth_sum as f64 / moves as f64 } else { 0.0 };
        info!("game {number} finished: {moves} moves, average depth {avg_depth:.2}");
        println!(
            "Game {number}: score {}, max tile {max_tile}, {moves} moves, avg depth {avg_depth:.1}",
            game.score()
        );
        results.push((game.score(), max_tile));
    }

    if results.len() > 1 {
        let total: u64 = results.iter().map(|(score, _)| score).sum();
        let best = results.iter().map(|(score, _)| *score).max().unwrap_or(0);
        println!("\n=== {} games ===", results.len());
        println!("  average score: {:.0}", total as f64 / results.len() as f64);
        println!("  best score:    {best}");

        let mut tiles: Vec<u32> = results.iter().map(|(_, tile)| *tile).collect();
        tiles.sort_unstable();
        tiles.dedup();
        for tile in tiles.into_iter().rev() {
            let reached = results.iter().filter(|(_, t)| *t >= tile).count();
            println!(
                "  reached {tile:>6}: {:>5.1}%",
                100.0 * reached as f64 / results.len() as f64
            );
        }
    }

    Ok(())
}
