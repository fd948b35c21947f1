//! HEX CRUSADE Core - Battle simulation engine
//!
//! This crate provides the turn-based engine behind HEX CRUSADE:
//! - Hex geometry (odd-row offset grid, cube distance)
//! - Seeded terrain generation
//! - Reachability and target search
//! - Combat resolution and the ability table
//! - Greedy enemy AI
//! - Turn/phase state machine with narrative and score events

pub mod hex;
pub mod terrain;
pub mod grid;
pub mod units;
pub mod campaign;
pub mod battlefield;
pub mod pathfinding;
pub mod combat;
pub mod ai;
pub mod schedule;
pub mod narrative;
pub mod score;
pub mod game;
pub mod error;

// Re-exports for convenient access
pub use hex::{Cell, COLS, ROWS, distance, neighbors};
pub use terrain::{TerrainKind, TerrainProfile};
pub use grid::{Grid, Tile};
pub use units::{Ability, Team, Unit, UnitId, UnitKind};
pub use campaign::{BattleDef, Campaign};
pub use battlefield::Battlefield;
pub use combat::Dice;
pub use ai::AiDecision;
pub use schedule::Step;
pub use narrative::{EngineEvent, NarrativePayload, NarrativeSink, Recorder, ScoreSink};
pub use score::compute_score;
pub use game::{ActionKind, EngineConfig, GameState, Phase, TurnContext};
pub use error::{CampaignError, Rejection};
