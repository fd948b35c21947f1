//! HEX CRUSADE Runner - Headless campaign driver
//!
//! This crate drives the engine without a presentation layer:
//! - Player-side autopilot policies
//! - Single-campaign runner that releases queued enemy steps
//! - Parallel batches over many seeds
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_batch (orchestration)
//! - Level 2: CampaignRunner::play (one campaign)
//! - Level 3: PlayerPolicy::take_turn (one player turn)
//! - Level 4: utilities, configuration

mod autopilot;
mod batch;
mod config;
mod game_runner;

pub use autopilot::{policy_for, GreedyPolicy, PassivePolicy, PlayerPolicy};
pub use batch::{run_batch, run_batch_with_callback, BatchSummary};
pub use config::{PolicyKind, RunnerConfig};
pub use game_runner::{CampaignRunner, RunOutcome, RunResult};
