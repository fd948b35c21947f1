//! Campaign runner - plays one campaign start to finish
//!
//! Level 2 - Phase-level implementation

use serde::Serialize;

use hexcrusade_core::{
    CampaignError, GameState, NarrativeSink, Phase, Recorder, Rejection, ScoreSink, Team,
};

use crate::autopilot::{policy_for, PlayerPolicy};
use crate::config::RunnerConfig;

/// How a campaign ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunResult {
    /// Every castle fell
    Victory,
    /// The squad was wiped out
    Defeat,
    /// Stopped at the turn limit
    TurnLimit,
    /// The engine refused a control input or sat in a phase the runner
    /// cannot drive
    Stalled,
}

/// Outcome of a single campaign
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub seed: Option<u64>,
    pub result: RunResult,
    /// Battle reached (0-based) when the run ended
    pub battle_index: usize,
    pub battles_won: u32,
    pub kills: u32,
    pub survivors: u32,
    pub turns: u32,
    pub score: i64,
}

impl RunOutcome {
    pub fn is_victory(&self) -> bool {
        self.result == RunResult::Victory
    }
}

/// Plays campaigns with a player policy
pub struct CampaignRunner {
    /// Runner configuration
    config: RunnerConfig,
    policy: Box<dyn PlayerPolicy>,
}

impl CampaignRunner {
    pub fn new(config: RunnerConfig) -> Self {
        let policy = policy_for(config.policy);
        Self { config, policy }
    }

    /// Swap in a custom policy
    pub fn with_policy(mut self, policy: Box<dyn PlayerPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Play one campaign, discarding narrative and score events
    pub fn play(&mut self) -> Result<RunOutcome, CampaignError> {
        let mut sink = Recorder::default();
        let mut scores = Recorder::default();
        self.play_with_sinks(&mut sink, &mut scores)
    }

    /// Play one campaign, forwarding engine events as they happen
    ///
    /// Enemy turns are released through the engine clock one step at a time,
    /// the way a real-time host would after each animation delay.
    pub fn play_with_sinks(
        &mut self,
        story: &mut dyn NarrativeSink,
        scores: &mut dyn ScoreSink,
    ) -> Result<RunOutcome, CampaignError> {
        let seed = self.config.engine.seed;
        let mut state = GameState::new(self.config.engine.clone())?;
        let session = format!("headless-{}", seed.map_or_else(|| "entropy".to_string(), |s| s.to_string()));
        let ready = accepted(state.on_ready(&session), "on_ready") && accepted(state.start(), "start");
        state.flush(story, scores);

        tracing::info!(policy = self.policy.name(), ?seed, "campaign started");

        let outcome = if ready {
            self.drive(&mut state, story, scores)
        } else {
            snapshot(&state, seed, RunResult::Stalled)
        };
        state.flush(story, scores);

        tracing::info!(
            result = ?outcome.result,
            battles_won = outcome.battles_won,
            turns = outcome.turns,
            score = outcome.score,
            "campaign finished"
        );
        Ok(outcome)
    }

    /// Run the turn loop on a started engine until the campaign ends
    fn drive(
        &mut self,
        state: &mut GameState,
        story: &mut dyn NarrativeSink,
        scores: &mut dyn ScoreSink,
    ) -> RunOutcome {
        let seed = self.config.engine.seed;
        loop {
            match state.phase() {
                Phase::PlayerTurn | Phase::SelectAction | Phase::SelectTarget => {
                    if state.total_turns() > self.config.max_turns {
                        return snapshot(state, seed, RunResult::TurnLimit);
                    }
                    self.policy.take_turn(state);
                }
                Phase::EnemyTurn => match state.schedule().time_to_next() {
                    Some(delay) => state.tick(delay),
                    None => {
                        tracing::error!("enemy turn with nothing scheduled");
                        return snapshot(state, seed, RunResult::Stalled);
                    }
                },
                Phase::BattleEnd => {
                    let last = state.battle_index() + 1 == state.config().campaign.len();
                    let done = last.then(|| snapshot(state, seed, RunResult::Victory));
                    if !accepted(state.advance(), "advance") {
                        return snapshot(state, seed, RunResult::Stalled);
                    }
                    if let Some(outcome) = done {
                        return outcome;
                    }
                }
                Phase::GameOver => {
                    let outcome = snapshot(state, seed, RunResult::Defeat);
                    if !accepted(state.advance(), "advance") {
                        return snapshot(state, seed, RunResult::Stalled);
                    }
                    return outcome;
                }
                phase @ (Phase::Menu | Phase::Animating) => {
                    tracing::error!(?phase, "campaign loop left the battle phases");
                    return snapshot(state, seed, RunResult::Stalled);
                }
            }
            state.flush(story, scores);
        }
    }
}

/// Log a refused control input. Returns whether the engine took it.
fn accepted(result: Result<(), Rejection>, input: &'static str) -> bool {
    match result {
        Ok(()) => true,
        Err(rejection) => {
            tracing::error!(%rejection, input, "engine refused runner input");
            false
        }
    }
}

/// Capture the run before the engine resets its counters
fn snapshot(state: &GameState, seed: Option<u64>, result: RunResult) -> RunOutcome {
    RunOutcome {
        seed,
        result,
        battle_index: state.battle_index(),
        battles_won: state.battles_won(),
        kills: state.kills(),
        survivors: state.field().living_count(Team::Player) as u32,
        turns: state.total_turns(),
        score: state.score(),
    }
}
