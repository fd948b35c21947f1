//! Configuration types for headless play
//!
//! Level 4 - Utilities and configuration

use std::fmt;
use std::str::FromStr;

use hexcrusade_core::EngineConfig;

/// Which player-side policy drives the squad
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    /// Push toward the castle, attack whatever is in reach
    #[default]
    Greedy,
    /// End every turn without acting
    Passive,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Greedy => write!(f, "greedy"),
            PolicyKind::Passive => write!(f, "passive"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(PolicyKind::Greedy),
            "passive" => Ok(PolicyKind::Passive),
            other => Err(format!("unknown policy '{}' (expected greedy or passive)", other)),
        }
    }
}

/// Runner configuration
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Player-side policy
    pub policy: PolicyKind,
    /// Stop a campaign after this many player turns
    pub max_turns: u32,
    /// Engine settings, seed included
    pub engine: EngineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Greedy,
            max_turns: 200,
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.engine.seed = Some(seed);
        self
    }
}
