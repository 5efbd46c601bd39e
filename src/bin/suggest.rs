use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use game2048::board::GameState;
use game2048::engine::{evaluate_breakdown, get_best_move, search_depth, AiConfig};

#[derive(Debug, Parser)]
#[command(name = "suggest", about = "Print the AI's move for a game state given as JSON")]
struct Args {
    /// File holding {"grid": [[2, null, ...], ...], "score": n}; reads stdin when omitted
    state: Option<PathBuf>,

    /// Search exactly this deep instead of deepening against the clock
    #[arg(short, long)]
    depth: Option<u32>,

    /// Search budget in milliseconds (overrides the config file)
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// JSON file holding an AiConfig
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the evaluation terms of the given state
    #[arg(long)]
    explain: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AiConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => AiConfig::new(),
    };
    if let Some(ms) = args.time_limit {
        config.time_limit_ms = ms;
    }

    let text = match &args.state {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let state: GameState = serde_json::from_str(&text).context("parsing game state")?;

    if args.explain {
        let breakdown = evaluate_breakdown(&state, &config.weights);
        eprintln!("{}", serde_json::to_string_pretty(&breakdown)?);
    }

    let result = match args.depth {
        Some(0) => anyhow::bail!("depth must be at least 1"),
        Some(depth) => search_depth(&state, depth, &config),
        None => get_best_move(&state, &config),
    };

    match result {
        Some(result) => println!("{}", serde_json::to_string(&result)?),
        None => {
            eprintln!("no legal move: the game is over");
            std::process::exit(1);
        }
    }
    Ok(())
}
