// Binary that replays a folder of saved board snapshots (one JSON file per
// tick, named after the tick number) through a single agent's bot, printing
// each decision. Used to debug route memory across a recorded match.
//
// Note that this does not simulate the game -- the agent's position in each
// snapshot is whatever the host recorded, not the result of our moves.

use clap::Parser;
use env_logger::Env;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Error as JSONError;
use thiserror::Error;

use diamond_bot::bot::{Bot, Error as BotError};
use diamond_bot::config::{ConfigError, EngineConfig, Profile};
use diamond_bot::game_interface::Board;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding `<tick>.json` board snapshots.
    directory: String,

    /// Agent to make decisions for.
    #[arg(long, default_value_t = 1)]
    agent_id: u32,

    /// Engine config JSON file. Defaults to the greedy preset.
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Debug, Clone)]
struct SavedTick {
    tick: u32,
    path: String,
}

#[derive(Error, Debug)]
enum ReplayError {
    #[error("Failed reading the saved tick")]
    ReadError(#[from] std::io::Error),
    #[error("Failed parsing the saved tick")]
    ParseError(#[from] JSONError),
    #[error("Invalid engine config")]
    ConfigError(#[from] ConfigError),
    #[error("Bot failed on the saved tick")]
    BotError(#[from] BotError),
}

fn read_saved_ticks(directory: &str) -> Result<Vec<SavedTick>, ReplayError> {
    lazy_static! {
        static ref TICK_PATH: Regex = Regex::new(r"(\d+)\.json$").unwrap();
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path().to_string_lossy().to_string();
        if let Some(tick) = TICK_PATH.captures(&path)
            .and_then(|caps| caps.get(1))
            .and_then(|tick| tick.as_str().parse::<u32>().ok()) {
            out.push(SavedTick { tick, path });
        }
    }
    Ok(out.into_iter().sorted_by_key(|saved| saved.tick).collect())
}

fn replay_tick(bot: &mut Bot, agent_id: u32, saved: &SavedTick) -> Result<String, ReplayError> {
    let data = std::fs::read_to_string(&saved.path)?;
    let board: Board = serde_json::from_str(&data)?;
    let game_move = bot.next_move(agent_id, &board)?;
    Ok(format!("({:+}, {:+}) targets {:?} waypoint {:?}",
               game_move.dx, game_move.dy, bot.memory().targets, bot.memory().waypoint))
}

fn main() -> Result<(), ReplayError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::preset(Profile::Greedy),
    };
    let mut bot = Bot::new(config);
    let saved_ticks = read_saved_ticks(&cli.directory)?;
    println!("{} saved tick(s)", saved_ticks.len());

    let mut failures = 0;
    for saved in &saved_ticks {
        match replay_tick(&mut bot, cli.agent_id, saved) {
            Ok(summary) => println!("  tick #{}: {}", saved.tick, summary),
            Err(err) => {
                println!("  tick #{}: error: {err:?}", saved.tick);
                failures += 1;
            },
        }
    }

    println!("Replay stats:");
    println!("  ticks: {}", saved_ticks.len());
    println!("  failures: {}", failures);
    Ok(())
}
