// Host bridge: one JSON tick per stdin line in, one JSON move per stdout line out.
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use rustc_hash::FxHashMap;
use serde_json::Error as JSONError;
use std::io::{self, BufRead, Write};
use thiserror::Error;

use diamond_bot::bot::Bot;
use diamond_bot::config::{ConfigError, EngineConfig, Profile};
use diamond_bot::game_interface::{Move, TickRequest};

#[derive(ValueEnum, Clone, Copy)]
enum ProfileName {
    /// Value per distance, returns on low time or when base is close.
    Greedy,
    /// Risk-discounted scoring, returns when the composite risk is too high.
    RiskAverse,
    /// Time-weighted scoring, returns on an urgency threshold.
    TimeWeighted,
    /// Risk-based returns, keeps away from opponents when idle.
    Evasive,
}

impl From<ProfileName> for Profile {
    fn from(name: ProfileName) -> Self {
        match name {
            ProfileName::Greedy => Profile::Greedy,
            ProfileName::RiskAverse => Profile::RiskAverse,
            ProfileName::TimeWeighted => Profile::TimeWeighted,
            ProfileName::Evasive => Profile::Evasive,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Strategy preset to use when no config file is given.
    #[arg(short, long, value_enum, default_value_t = ProfileName::Greedy)]
    profile: ProfileName,

    /// Engine config JSON file. Falls back to the BOT_CONFIG env var.
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Error, Debug)]
enum Error {
    #[error("Unable to read or write a tick ({0})")]
    IoError(#[from] io::Error),
    #[error("Unable to serialize a move ({0})")]
    JSONError(#[from] JSONError),
    #[error("Invalid engine config ({0})")]
    ConfigError(#[from] ConfigError),
}

fn load_config(cli: &Cli) -> Result<EngineConfig, ConfigError> {
    let path = cli.config.clone().or_else(|| dotenvy::var("BOT_CONFIG").ok());
    match path {
        Some(path) => EngineConfig::from_file(path),
        None => {
            info!("[CONFIG] Using the default config for this profile.");
            Ok(EngineConfig::preset(cli.profile.into()))
        },
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = load_config(&cli)?;
    info!("[CONFIG] {config:?}");
    // Each agent gets its own bot, and with it its own route memory.
    let mut bots: FxHashMap<u32, Bot> = FxHashMap::default();
    let mut stdout = io::stdout().lock();

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let request: TickRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                warn!("Skipping malformed tick ({err})");
                continue;
            },
        };
        let bot = bots.entry(request.agent_id)
            .or_insert_with(|| Bot::new(config.clone()));
        let game_move = bot.next_move(request.agent_id, &request.board)
            .unwrap_or_else(|err| {
                error!("Error while deciding, staying put: {err}");
                Move::STAY
            });
        info!("Move of agent {} is: {:?}", request.agent_id, game_move);
        writeln!(stdout, "{}", serde_json::to_string(&game_move)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn main() {
    // Load .env file
    dotenvy::dotenv().ok();
    // Init logger with default value of info
    // This can be overriden with RUST_LOG env var
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        error!("Error while running bot with underlying error:");
        error!("  {}", err);
        std::process::exit(1);
    }
}
