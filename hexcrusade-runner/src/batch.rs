//! Batch play - many seeded campaigns in parallel
//!
//! Level 1 - Orchestration

use rayon::prelude::*;
use serde::Serialize;

use hexcrusade_core::CampaignError;

use crate::config::RunnerConfig;
use crate::game_runner::{CampaignRunner, RunOutcome, RunResult};

/// Aggregate results over a batch
#[derive(Clone, Debug, Serialize)]
pub struct BatchSummary {
    pub games: usize,
    pub victories: usize,
    pub defeats: usize,
    pub turn_limits: usize,
    pub stalled: usize,
    pub avg_score: f64,
    pub best_score: i64,
    pub worst_score: i64,
    pub avg_battles_won: f64,
    pub avg_turns: f64,
    /// Individual outcomes in seed order
    pub outcomes: Vec<RunOutcome>,
}

impl BatchSummary {
    /// Summarise a set of outcomes
    pub fn from_outcomes(outcomes: Vec<RunOutcome>) -> Self {
        let games = outcomes.len();
        let count = |r: RunResult| outcomes.iter().filter(|o| o.result == r).count();
        let mean = |f: &dyn Fn(&RunOutcome) -> f64| {
            if games == 0 {
                0.0
            } else {
                outcomes.iter().map(f).sum::<f64>() / games as f64
            }
        };

        Self {
            games,
            victories: count(RunResult::Victory),
            defeats: count(RunResult::Defeat),
            turn_limits: count(RunResult::TurnLimit),
            stalled: count(RunResult::Stalled),
            avg_score: mean(&|o| o.score as f64),
            best_score: outcomes.iter().map(|o| o.score).max().unwrap_or(0),
            worst_score: outcomes.iter().map(|o| o.score).min().unwrap_or(0),
            avg_battles_won: mean(&|o| f64::from(o.battles_won)),
            avg_turns: mean(&|o| f64::from(o.turns)),
            outcomes,
        }
    }

    /// Fraction of campaigns won
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.victories as f64 / self.games as f64
        }
    }
}

/// Play `games` campaigns with seeds `base_seed..base_seed + games`
pub fn run_batch(config: &RunnerConfig, games: usize, base_seed: u64) -> Result<BatchSummary, CampaignError> {
    run_batch_with_callback(config, games, base_seed, |_| {})
}

/// Same as `run_batch`, calling `on_done` as each campaign finishes
pub fn run_batch_with_callback<F>(
    config: &RunnerConfig,
    games: usize,
    base_seed: u64,
    on_done: F,
) -> Result<BatchSummary, CampaignError>
where
    F: Fn(&RunOutcome) + Sync,
{
    config.engine.campaign.validate()?;
    tracing::info!(games, base_seed, policy = %config.policy, "batch started");

    let outcomes = (0..games as u64)
        .into_par_iter()
        .map(|i| {
            let seeded = config.clone().with_seed(base_seed.wrapping_add(i));
            let outcome = CampaignRunner::new(seeded).play()?;
            on_done(&outcome);
            Ok(outcome)
        })
        .collect::<Result<Vec<_>, CampaignError>>()?;

    let summary = BatchSummary::from_outcomes(outcomes);
    tracing::info!(
        victories = summary.victories,
        defeats = summary.defeats,
        avg_score = summary.avg_score,
        "batch finished"
    );
    Ok(summary)
}
