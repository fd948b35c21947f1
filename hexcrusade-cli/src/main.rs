//! HEX CRUSADE CLI - Command-line interface
//!
//! Commands:
//! - play: Autopilot one campaign and print the story as it unfolds
//! - map: Dump a battle's generated terrain and spawn layout
//! - batch: Play many seeded campaigns in parallel

mod batch_cmd;
mod map_cmd;
mod play_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexcrusade")]
#[command(about = "HEX CRUSADE hex-grid tactics engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log engine decisions (debug level)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Autopilot a single campaign
    Play(play_cmd::PlayArgs),
    /// Show a battle's map
    Map(map_cmd::MapArgs),
    /// Play many campaigns and summarise
    Batch(batch_cmd::BatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Map(args) => map_cmd::run(args),
        Commands::Batch(args) => batch_cmd::run(args, cli.seed),
    }
}
