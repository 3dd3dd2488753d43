//! # Voicekeeper CLI
//!
//! Companion binary for the voicekeeper presence tracker. The long-running
//! service is embedded through the library crate; this binary inspects a
//! voicekeeper data directory offline (voice-time totals, event history,
//! stay channels) and manages configuration.
//!
//! ## Usage
//!
//! ```bash
//! voicekeeper leaderboard -n 10
//! voicekeeper history --data-dir /srv/voicekeeper/data
//! voicekeeper check
//! ```

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use voicekeeper::config::Config;
use voicekeeper::display::format_duration;
use voicekeeper::error::Result;
use voicekeeper::ledger::VoiceLedger;
use voicekeeper::models::{ChannelId, GuildId, UserId};
use voicekeeper::stats;
use voicekeeper::store::{DocumentStore, HISTORY_KEY, STAYS_KEY, TOTALS_KEY};
use voicekeeper::version::version_string;

/// Voicekeeper - voice presence tracking for group-chat servers
#[derive(Parser)]
#[command(name = "voicekeeper")]
#[command(version = env!("VOICEKEEPER_VERSION"))]
#[command(about = "Voice presence tracking for group-chat servers", long_about = None)]
#[command(
    after_help = "Reads the data directory of a voicekeeper service. Totals and\nhistory reflect closed sessions only; a running service adds\nopen-session time to its own query responses.\n\nExample:\n  voicekeeper leaderboard -n 5 --data-dir /srv/voicekeeper"
)]
struct Cli {
    /// Show detailed version information
    #[arg(long = "version-full")]
    version_full: bool,

    /// Data directory to inspect (defaults to the configured location)
    #[arg(long = "data-dir", global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show total voice time for one user
    Stats {
        /// Numeric user id
        user: UserId,
    },

    /// Show the voice-time leaderboard
    Leaderboard {
        /// Number of entries to show (capped at 25)
        #[arg(short = 'n', long = "limit", default_value_t = 10)]
        limit: usize,
    },

    /// Show recent voice events, oldest first
    History {
        /// Number of lines to show (capped at 50)
        #[arg(short = 'n', long = "limit", default_value_t = 20)]
        limit: usize,
    },

    /// Show configured 24/7 stay channels
    Stays,

    /// Validate configuration, token, and data directory
    Check,

    /// Generate example config file
    GenerateConfig,
}

fn main() -> Result<()> {
    // Initialize logging with WARN level by default (can be overridden with RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Handle version-full flag
    if cli.version_full {
        print!("{}", version_string());
        return Ok(());
    }

    match cli.command {
        Some(Commands::Stats { user }) => cmd_stats(user, cli.data_dir.as_deref()),
        Some(Commands::Leaderboard { limit }) => cmd_leaderboard(limit, cli.data_dir.as_deref()),
        Some(Commands::History { limit }) => cmd_history(limit, cli.data_dir.as_deref()),
        Some(Commands::Stays) => cmd_stays(cli.data_dir.as_deref()),
        Some(Commands::Check) => cmd_check(cli.data_dir.as_deref()),
        Some(Commands::GenerateConfig) => cmd_generate_config(),
        None => cmd_overview(cli.data_dir.as_deref()),
    }
}

/// Effective data directory: CLI flag wins, then config (which falls back
/// to the platform data dir).
fn resolve_data_dir(override_dir: Option<&Path>, config: &Config) -> PathBuf {
    match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => config.store.data_dir_path(),
    }
}

/// Rebuild a ledger from the persisted documents. Offline there are no open
/// sessions, so totals are exactly the closed-session sums.
fn load_ledger(store: &DocumentStore, max_history: usize) -> VoiceLedger {
    let history: Vec<String> = store.load(HISTORY_KEY, Vec::new());
    let totals: HashMap<UserId, u64> = store.load(TOTALS_KEY, HashMap::new());
    VoiceLedger::from_documents(history, totals, max_history)
}

fn cmd_stats(user: UserId, data_dir: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let store = DocumentStore::new(resolve_data_dir(data_dir, &config))?;
    let ledger = load_ledger(&store, config.tracker.max_history);

    let total = stats::user_total(&ledger, user, Utc::now());
    if total == 0 {
        println!("User {} has no recorded voice time.", user);
    } else {
        println!("User {}: {}", user, format_duration(total));
    }
    Ok(())
}

fn cmd_leaderboard(limit: usize, data_dir: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let store = DocumentStore::new(resolve_data_dir(data_dir, &config))?;
    let ledger = load_ledger(&store, config.tracker.max_history);

    let entries = stats::leaderboard(&ledger, limit, Utc::now());
    if entries.is_empty() {
        println!("No voice activity recorded yet.");
        return Ok(());
    }
    for (rank, entry) in entries.iter().enumerate() {
        let marker = if entry.live { " (live)" } else { "" };
        println!(
            "{:>2}. {:<20} {}{}",
            rank + 1,
            entry.user,
            format_duration(entry.seconds),
            marker
        );
    }
    Ok(())
}

fn cmd_history(limit: usize, data_dir: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let store = DocumentStore::new(resolve_data_dir(data_dir, &config))?;
    let ledger = load_ledger(&store, config.tracker.max_history);

    let lines = stats::recent_history(&ledger, limit);
    if lines.is_empty() {
        println!("No history recorded yet.");
        return Ok(());
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_stays(data_dir: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let store = DocumentStore::new(resolve_data_dir(data_dir, &config))?;

    let stays: HashMap<GuildId, ChannelId> = store.load(STAYS_KEY, HashMap::new());
    if stays.is_empty() {
        println!("No stay channels configured.");
        return Ok(());
    }
    // BTreeMap for stable output order
    let ordered: BTreeMap<GuildId, ChannelId> = stays.into_iter().collect();
    for (guild, channel) in ordered {
        println!("Guild {} -> channel {}", guild, channel);
    }
    Ok(())
}

/// Validate the parts bootstrap depends on. Prints every finding rather than
/// stopping at the first, then exits non-zero if anything failed.
fn cmd_check(data_dir: Option<&Path>) -> Result<()> {
    println!("Checking voicekeeper configuration...\n");
    let mut failures = 0;

    match Config::find_config_file() {
        Some(path) => println!("  config file:    {}", path.display()),
        None => println!("  config file:    none found (defaults + VOICEKEEPER_* env)"),
    }

    let config = match Config::load() {
        Ok(config) => {
            println!("  config parse:   ok");
            config
        }
        Err(e) => {
            println!("  config parse:   FAILED: {}", e);
            failures += 1;
            let mut fallback = Config::default();
            fallback.apply_env_overrides();
            fallback.normalize();
            fallback
        }
    };

    // Never print the resolved token itself
    match config.resolve_token() {
        Ok(_) => println!("  token:          ok"),
        Err(e) => {
            println!("  token:          FAILED: {}", e);
            failures += 1;
        }
    }

    let dir = resolve_data_dir(data_dir, &config);
    let existed = dir.exists();
    match DocumentStore::new(&dir) {
        Ok(store) => {
            if existed {
                println!("  data directory: {}", dir.display());
            } else {
                println!("  data directory: {} (created)", dir.display());
            }
            let totals: HashMap<UserId, u64> = store.load(TOTALS_KEY, HashMap::new());
            let history: Vec<String> = store.load(HISTORY_KEY, Vec::new());
            let stays: HashMap<GuildId, ChannelId> = store.load(STAYS_KEY, HashMap::new());
            println!(
                "  documents:      {} tracked users, {} history lines, {} stays",
                totals.len(),
                history.len(),
                stays.len()
            );
        }
        Err(e) => {
            println!("  data directory: FAILED: {}", e);
            failures += 1;
        }
    }

    if failures > 0 {
        println!("\nConfiguration check failed ({} problem(s)).", failures);
        std::process::exit(1);
    }
    println!("\nConfiguration check passed.");
    Ok(())
}

fn cmd_generate_config() -> Result<()> {
    let config_path = Config::default_config_path()?;
    println!("Generating example config file at: {:?}", config_path);

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write example config
    std::fs::write(&config_path, Config::example_toml())?;
    println!("Config file generated successfully!");
    println!("Edit {} to customize settings", config_path.display());
    Ok(())
}

/// Bare invocation: a one-screen summary of the data directory.
fn cmd_overview(data_dir: Option<&Path>) -> Result<()> {
    let config = Config::load()?;
    let dir = resolve_data_dir(data_dir, &config);
    let store = DocumentStore::new(&dir)?;
    let ledger = load_ledger(&store, config.tracker.max_history);
    let stays: HashMap<GuildId, ChannelId> = store.load(STAYS_KEY, HashMap::new());

    println!("Voicekeeper data directory: {}", dir.display());
    println!("  tracked users:  {}", ledger.totals().len());
    println!("  history lines:  {}", ledger.history().len());
    println!("  stay channels:  {}", stays.len());
    println!();
    println!("Run 'voicekeeper help' for available commands.");
    Ok(())
}
