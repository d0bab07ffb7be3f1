use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use contracts::Decision;
use serde::Serialize;
use story_api::{
    serve, ServerConfig, SqliteSessionStore, StoreBackend, StoryApi, DEFAULT_SQLITE_PATH,
};
use story_core::compare_plans;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const OFFLINE_SESSION: &str = "cli-offline";

#[derive(Parser)]
#[command(name = "story-cli")]
#[command(about = "MediShield story game backend and offline calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API. Flags override MEDISHIELD_* environment settings.
    Serve {
        #[arg(long, env = "MEDISHIELD_BIND_ADDR")]
        addr: Option<SocketAddr>,
        /// "sqlite" or "memory"
        #[arg(long, env = "MEDISHIELD_STORE")]
        store: Option<String>,
        #[arg(long, env = "MEDISHIELD_SQLITE_PATH")]
        sqlite_path: Option<PathBuf>,
    },
    /// Print the insurance options as JSON
    Options,
    /// Print the characters as JSON
    Characters,
    /// Print the scenarios as JSON
    Scenarios,
    /// Print up to `count` distinct random scenarios
    Random {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Price a scenario for a set of plan choices without starting a server
    Outcome {
        scenario_id: String,
        /// character_id=insurance_option_id, repeatable
        #[arg(long = "choice", value_parser = parse_choice)]
        choices: Vec<(String, String)>,
    },
    /// Print the basic versus enhanced premium comparison
    Compare,
    /// List sessions persisted in the SQLite store
    Sessions {
        #[arg(long, env = "MEDISHIELD_SQLITE_PATH")]
        sqlite_path: Option<PathBuf>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn parse_choice(raw: &str) -> Result<(String, String), String> {
    let (character_id, option_id) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected character_id=option_id, got {raw:?}"))?;
    let character_id = character_id.trim();
    let option_id = option_id.trim();
    if character_id.is_empty() || option_id.is_empty() {
        return Err(format!("empty id in choice {raw:?}"));
    }
    Ok((character_id.to_string(), option_id.to_string()))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries JSON output for the listing commands
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn serve_config(
    addr: Option<SocketAddr>,
    store: Option<String>,
    sqlite_path: Option<PathBuf>,
) -> Result<ServerConfig> {
    let mut config = ServerConfig::from_env().context("reading MEDISHIELD_* environment")?;

    if let Some(addr) = addr {
        config.bind_addr = addr;
    }
    match (store, sqlite_path) {
        (Some(kind), path) => {
            let path = path.or_else(|| match &config.store {
                StoreBackend::Sqlite(existing) => Some(existing.clone()),
                StoreBackend::Memory => None,
            });
            config.store = StoreBackend::parse(&kind, path)?;
        }
        (None, Some(path)) => config.store = StoreBackend::Sqlite(path),
        (None, None) => {}
    }

    Ok(config)
}

fn offline_outcome(scenario_id: &str, choices: &[(String, String)]) -> Result<()> {
    let thresholds = ServerConfig::from_env()
        .context("reading MEDISHIELD_* environment")?
        .thresholds;
    let mut api = StoryApi::in_memory().with_thresholds(thresholds);
    api.start_session(OFFLINE_SESSION)?;

    for (character_id, option_id) in choices {
        let effect = api.record_decision(OFFLINE_SESSION, &Decision::new(character_id, option_id))?;
        if !effect.is_applied() {
            tracing::warn!(character_id = %character_id, "no such character; choice ignored");
        }
    }

    let report = api.calculate_outcome(OFFLINE_SESSION, scenario_id)?;
    print_json(&report)
}

fn sqlite_path_for_listing(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    match ServerConfig::from_env()?.store {
        StoreBackend::Sqlite(path) => Ok(path),
        StoreBackend::Memory => Ok(PathBuf::from(DEFAULT_SQLITE_PATH)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            addr,
            store,
            sqlite_path,
        } => {
            let config = serve_config(addr, store, sqlite_path)?;
            serve(config).await?;
        }
        Commands::Options => print_json(StoryApi::in_memory().catalog().insurance_options())?,
        Commands::Characters => print_json(StoryApi::in_memory().catalog().characters())?,
        Commands::Scenarios => print_json(StoryApi::in_memory().catalog().scenarios())?,
        Commands::Random { count } => {
            print_json(&StoryApi::in_memory().catalog().pick_random_scenarios(count))?
        }
        Commands::Outcome {
            scenario_id,
            choices,
        } => offline_outcome(&scenario_id, &choices)?,
        Commands::Compare => {
            let api = StoryApi::in_memory();
            let comparison = compare_plans(api.catalog())
                .ok_or_else(|| anyhow!("catalog lacks a basic or an enhanced plan"))?;
            print_json(&comparison)?;
        }
        Commands::Sessions { sqlite_path, limit } => {
            let path = sqlite_path_for_listing(sqlite_path)?;
            if !path.exists() {
                bail!("no session database at {}", path.display());
            }
            let store = SqliteSessionStore::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            print_json(&store.list_sessions(limit)?)?;
        }
    }

    Ok(())
}
