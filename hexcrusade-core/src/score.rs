//! Run scoring

/// Points per completed battle
pub const BATTLE_POINTS: i64 = 1000;
/// Points per enemy killed
pub const KILL_POINTS: i64 = 10;
/// Points per surviving squad member
pub const SURVIVOR_POINTS: i64 = 500;
/// Penalty per player turn taken
pub const TURN_PENALTY: i64 = 5;

/// `battles*1000 + kills*10 + survivors*500 - turns*5`
pub fn compute_score(battles_completed: u32, kills: u32, survivors: u32, total_turns: u32) -> i64 {
    i64::from(battles_completed) * BATTLE_POINTS + i64::from(kills) * KILL_POINTS + i64::from(survivors) * SURVIVOR_POINTS
        - i64::from(total_turns) * TURN_PENALTY
}
