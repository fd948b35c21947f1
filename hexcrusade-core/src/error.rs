//! Error types

use std::path::PathBuf;

use thiserror::Error;

use crate::game::Phase;
use crate::hex::Cell;

/// An input the engine refused. State is left untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("host has not signalled ready")]
    NotReady,
    #[error("{action} is not available during {phase:?}")]
    WrongPhase { phase: Phase, action: &'static str },
    #[error("cell {0} is off the grid")]
    OutOfBounds(Cell),
    #[error("no living player unit at {0}")]
    NotPlayerUnit(Cell),
    #[error("no unit selected")]
    NoSelection,
    #[error("selected unit already moved this turn")]
    AlreadyMoved,
    #[error("selected unit already acted this turn")]
    AlreadyActed,
    #[error("selected unit has no ability in slot {0}")]
    UnknownAbility(usize),
    #[error("cell {0} is not a legal destination")]
    NotReachable(Cell),
}

/// Failure to load or validate a campaign definition
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("failed to read campaign {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse campaign: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("campaign has no battles")]
    Empty,
    #[error("battle {battle}: castle {cell} is off the grid")]
    CastleOutOfBounds { battle: usize, cell: Cell },
    #[error("battle {battle}: castle {cell} overlaps a spawn cell")]
    CastleOnSpawn { battle: usize, cell: Cell },
    #[error("battle {battle}: {count} enemies exceed the {max} spawn slots")]
    TooManyEnemies { battle: usize, count: usize, max: usize },
    #[error("battle {battle}: castle is not an enemy roster type")]
    CastleInRoster { battle: usize },
    #[error("battle {battle}: terrain cutoffs are not ordered")]
    BadTerrainProfile { battle: usize },
    #[error("heal ratio {0} is outside 0..=1")]
    BadHealRatio(f64),
}
