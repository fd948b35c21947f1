//! Batch command - many seeded campaigns in parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play_batch(), report_summary()
//! - Level 3: progress bar wiring
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use hexcrusade_core::EngineConfig;
use hexcrusade_runner::{run_batch_with_callback, BatchSummary, PolicyKind, RunnerConfig};

use crate::map_cmd::load_campaign;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BatchArgs {
    /// Number of campaigns to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Campaign JSON file (defaults to the built-in campaign)
    #[arg(long, value_name = "FILE")]
    pub campaign: Option<PathBuf>,

    /// Player policy: greedy or passive
    #[arg(long, default_value = "greedy")]
    pub policy: PolicyKind,

    /// Give up on a campaign after this many player turns
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Output summary as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run batch command
pub fn run(args: BatchArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args)?;
    let base_seed = seed.unwrap_or_else(|| ChaCha8Rng::from_entropy().gen());

    tracing::info!(
        "Starting batch: {} campaigns of '{}' (policy={}, base seed={})",
        args.games,
        config.engine.campaign.name,
        config.policy,
        base_seed
    );

    let summary = play_batch(&config, args.games, base_seed, !args.json)?;
    report_summary(&summary, base_seed, args.json);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &BatchArgs) -> Result<RunnerConfig> {
    let campaign = load_campaign(args.campaign.as_deref())?;
    Ok(RunnerConfig::default()
        .with_engine(EngineConfig::default().with_campaign(campaign))
        .with_policy(args.policy)
        .with_max_turns(args.max_turns))
}

fn play_batch(config: &RunnerConfig, games: usize, base_seed: u64, show_progress: bool) -> Result<BatchSummary> {
    let progress = if show_progress {
        create_progress_bar(games as u64)
    } else {
        ProgressBar::hidden()
    };

    let summary = run_batch_with_callback(config, games, base_seed, |_| progress.inc(1))
        .context("Batch could not start")?;
    progress.finish_and_clear();
    Ok(summary)
}

fn report_summary(summary: &BatchSummary, base_seed: u64, json: bool) {
    if json {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            base_seed: u64,
            win_rate: f64,
            #[serde(flatten)]
            summary: &'a BatchSummary,
        }

        let output = JsonOutput {
            base_seed,
            win_rate: summary.win_rate(),
            summary,
        };
        if let Ok(json) = serde_json::to_string_pretty(&output) {
            println!("{}", json);
        }
        return;
    }

    println!("\n=== Batch Results ===");
    println!("Campaigns:    {} (seeds {}..{})", summary.games, base_seed, base_seed.wrapping_add(summary.games as u64));
    println!(
        "Victories:    {} ({:.1}%)",
        summary.victories,
        summary.win_rate() * 100.0
    );
    println!("Defeats:      {}", summary.defeats);
    println!("Turn limits:  {}", summary.turn_limits);
    if summary.stalled > 0 {
        println!("Stalled:      {}", summary.stalled);
    }
    println!("Avg score:    {:.1}", summary.avg_score);
    println!("Best score:   {}", summary.best_score);
    println!("Worst score:  {}", summary.worst_score);
    println!("Avg battles:  {:.2}", summary.avg_battles_won);
    println!("Avg turns:    {:.1}", summary.avg_turns);
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn create_progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} campaigns ({eta})") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
