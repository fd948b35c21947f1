//! Play command - autopilot one campaign and narrate it
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play_campaign(), report_outcome()
//! - Level 3: ConsoleSink (narrative and score output)
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use hexcrusade_core::{EngineConfig, NarrativePayload, NarrativeSink, ScoreSink};
use hexcrusade_runner::{CampaignRunner, PolicyKind, RunOutcome, RunnerConfig};

use crate::map_cmd::load_campaign;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// Campaign JSON file (defaults to the built-in campaign)
    #[arg(long, value_name = "FILE")]
    pub campaign: Option<PathBuf>,

    /// Player policy: greedy or passive
    #[arg(long, default_value = "greedy")]
    pub policy: PolicyKind,

    /// Give up after this many player turns
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Print narrative events and the result as JSON lines
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// 1. Build the runner configuration (drawing a seed if none was given)
/// 2. Play the campaign, printing story events as they happen
/// 3. Report the outcome
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;

    tracing::info!(
        "Starting campaign '{}' (policy={}, seed={:?})",
        config.engine.campaign.name,
        config.policy,
        config.engine.seed
    );

    let outcome = play_campaign(config, args.json)?;
    report_outcome(&outcome, args.json);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &PlayArgs, seed: Option<u64>) -> Result<RunnerConfig> {
    let campaign = load_campaign(args.campaign.as_deref())?;
    // Always run seeded so the printed seed reproduces the game
    let seed = seed.unwrap_or_else(|| create_rng(None).gen());
    let engine = EngineConfig::default().with_campaign(campaign).with_seed(seed);

    Ok(RunnerConfig::default()
        .with_engine(engine)
        .with_policy(args.policy)
        .with_max_turns(args.max_turns))
}

fn play_campaign(config: RunnerConfig, json: bool) -> Result<RunOutcome> {
    let mut console = ConsoleSink { json };
    let mut scores = ConsoleSink { json };
    CampaignRunner::new(config)
        .play_with_sinks(&mut console, &mut scores)
        .context("Campaign definition rejected")
}

fn report_outcome(outcome: &RunOutcome, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(outcome) {
            println!("{}", line);
        }
        return;
    }

    println!("\n=== Campaign Result ===");
    println!("Result:      {:?}", outcome.result);
    println!("Battles won: {}", outcome.battles_won);
    println!("Kills:       {}", outcome.kills);
    println!("Survivors:   {}", outcome.survivors);
    println!("Turns:       {}", outcome.turns);
    println!("Score:       {}", outcome.score);
    if let Some(seed) = outcome.seed {
        println!("Seed:        {}", seed);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Prints engine events to stdout
struct ConsoleSink {
    json: bool,
}

impl NarrativeSink for ConsoleSink {
    fn update(&mut self, payload: &NarrativePayload) {
        if self.json {
            if let Ok(line) = serde_json::to_string(payload) {
                println!("{}", line);
            }
        } else {
            println!("[{}] {}", payload.current_node, payload.event);
        }
    }
}

impl ScoreSink for ConsoleSink {
    fn submit(&mut self, score: i64) {
        if self.json {
            println!("{}", serde_json::json!({ "score": score }));
        } else {
            println!("Score submitted: {}", score);
        }
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
