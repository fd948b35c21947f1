//! Greedy nearest-target enemy AI
//!
//! One decision per enemy per enemy turn: attack the nearest player unit if
//! it is in range, otherwise step to the reachable cell closest to it and
//! attack if that brings it into range. No lookahead and no coordination.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::combat::{self, Dice};
use crate::hex::Cell;
use crate::pathfinding;
use crate::units::{Team, UnitId};

/// What an enemy did on its turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiDecision {
    /// Dead, castle, no player units left, or boxed in
    Idle,
    Attack { target: UnitId },
    Move { to: Cell },
    MoveAttack { to: Cell, target: UnitId },
}

/// Nearest living player unit; ties go to the earliest in the roster
pub fn nearest_player(field: &Battlefield, from: Cell) -> Option<(UnitId, i32)> {
    field
        .living(Team::Player)
        .map(|id| (id, from.distance_to(field.unit(id).cell)))
        .fold(None, |best, (id, dist)| match best {
            Some((_, best_dist)) if best_dist <= dist => best,
            _ => Some((id, dist)),
        })
}

/// Run one enemy's turn
pub fn act(field: &mut Battlefield, enemy: UnitId, dice: &mut Dice) -> AiDecision {
    let unit = field.unit(enemy);
    if !unit.alive || unit.is_castle() {
        return AiDecision::Idle;
    }
    let from = unit.cell;
    let range = unit.range;
    let can_move = !unit.moved;

    let Some((target, dist)) = nearest_player(field, from) else {
        return AiDecision::Idle;
    };

    if dist <= range {
        combat::attack(field, enemy, target, dice);
        return AiDecision::Attack { target };
    }

    // Frozen units hold position
    if !can_move {
        return AiDecision::Idle;
    }

    let goal = field.unit(target).cell;
    let best = pathfinding::reachable(field, enemy)
        .cells()
        .into_iter()
        .fold(None, |best: Option<(Cell, i32)>, cell| {
            let d = cell.distance_to(goal);
            match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((cell, d)),
            }
        });

    let Some((to, new_dist)) = best else {
        return AiDecision::Idle;
    };

    field.move_unit(enemy, to);
    if new_dist <= range {
        combat::attack(field, enemy, target, dice);
        AiDecision::MoveAttack { to, target }
    } else {
        AiDecision::Move { to }
    }
}
