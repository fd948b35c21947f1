//! Player-side autopilot policies
//!
//! Level 3 - Step-level implementation
//!
//! Policies only talk to the engine through its input methods, the same
//! surface a pointer-driven front end would use.

use hexcrusade_core::units::AbilityEffect;
use hexcrusade_core::{ActionKind, Cell, GameState, Team, UnitId};

use crate::config::PolicyKind;

/// Enemies closer than this pull a unit off its march to the castle
const ENGAGE_DISTANCE: i32 = 3;

/// Drives the player squad for one turn
pub trait PlayerPolicy: Send {
    fn name(&self) -> &'static str;

    /// Issue orders until the turn is handed to the enemy or the battle ends
    fn take_turn(&mut self, state: &mut GameState);
}

/// Box up the policy for a kind
pub fn policy_for(kind: PolicyKind) -> Box<dyn PlayerPolicy> {
    match kind {
        PolicyKind::Greedy => Box::new(GreedyPolicy),
        PolicyKind::Passive => Box::new(PassivePolicy),
    }
}

/// Ends every turn straight away
#[derive(Clone, Copy, Debug, Default)]
pub struct PassivePolicy;

impl PlayerPolicy for PassivePolicy {
    fn name(&self) -> &'static str {
        "passive"
    }

    fn take_turn(&mut self, state: &mut GameState) {
        let _ = state.end_turn();
    }
}

/// Act if something is in reach, march toward the castle, act again
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyPolicy;

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn take_turn(&mut self, state: &mut GameState) {
        let squad: Vec<UnitId> = state.field().living(Team::Player).collect();
        for id in squad {
            if !state.phase().is_player_input() {
                return;
            }
            try_act(state, id);
            march(state, id);
            try_act(state, id);
        }
        if state.phase().is_player_input() {
            let _ = state.end_turn();
        }
    }
}

/// Heal a badly hurt ally, else hit the best hostile target
fn try_act(state: &mut GameState, id: UnitId) -> bool {
    let unit = state.field().unit(id);
    if !unit.alive || unit.acted || !state.phase().is_player_input() {
        return false;
    }
    let cell = unit.cell;
    let abilities = unit.abilities.clone();
    if state.select_unit(cell).is_err() {
        return false;
    }

    let mut options = Vec::new();
    for (slot, ability) in abilities.iter().enumerate() {
        if matches!(ability.effect(), AbilityEffect::Heal { .. }) {
            options.insert(0, ActionKind::Ability(slot));
        } else if !ability.targets_allies() {
            options.push(ActionKind::Ability(slot));
        }
    }
    options.push(ActionKind::Attack);

    for kind in options {
        if state.choose_action(kind).is_err() {
            continue;
        }
        let pick = match kind {
            ActionKind::Ability(slot) if abilities[slot].targets_allies() => pick_heal_target(state),
            _ => pick_hostile_target(state),
        };
        match pick {
            Some(target) => return state.click_cell(target).is_ok(),
            None => {
                let _ = state.cancel();
            }
        }
    }
    let _ = state.cancel();
    false
}

/// Step to the reachable cell closest to the unit's goal
fn march(state: &mut GameState, id: UnitId) -> bool {
    let unit = state.field().unit(id);
    if !unit.alive || unit.moved || !state.phase().is_player_input() {
        return false;
    }
    let from = unit.cell;
    let Some(goal) = goal_for(state, from) else {
        return false;
    };
    if state.select_unit(from).is_err() {
        return false;
    }
    if state.choose_action(ActionKind::Move).is_err() {
        let _ = state.cancel();
        return false;
    }

    let best = state
        .context()
        .targets()
        .iter()
        .copied()
        .min_by_key(|c| (c.distance_to(goal), c.scan_key()));
    match best {
        Some(to) if to.distance_to(goal) < from.distance_to(goal) => state.click_cell(to).is_ok(),
        _ => {
            let _ = state.cancel();
            let _ = state.cancel();
            false
        }
    }
}

/// Nearby enemy if one is close, otherwise the castle
fn goal_for(state: &GameState, from: Cell) -> Option<Cell> {
    let field = state.field();
    let nearest = field
        .living(Team::Enemy)
        .filter(|&e| !field.unit(e).is_castle())
        .map(|e| field.unit(e).cell)
        .min_by_key(|c| (from.distance_to(*c), c.scan_key()));
    let castle = field.castle().filter(|&c| field.unit(c).alive).map(|c| field.unit(c).cell);

    match (nearest, castle) {
        (Some(enemy), _) if from.distance_to(enemy) <= ENGAGE_DISTANCE => Some(enemy),
        (_, Some(castle)) => Some(castle),
        (enemy, None) => enemy,
    }
}

/// Castle first, then the weakest enemy
fn pick_hostile_target(state: &GameState) -> Option<Cell> {
    let field = state.field();
    state
        .context()
        .targets()
        .iter()
        .copied()
        .filter_map(|cell| field.unit_at(cell).map(|id| (cell, field.unit(id))))
        .min_by_key(|(cell, unit)| (!unit.is_castle(), unit.hp, cell.scan_key()))
        .map(|(cell, _)| cell)
}

/// Ally at or below half health with the lowest hp ratio
fn pick_heal_target(state: &GameState) -> Option<Cell> {
    let field = state.field();
    state
        .context()
        .targets()
        .iter()
        .copied()
        .filter_map(|cell| field.unit_at(cell).map(|id| (cell, field.unit(id))))
        .filter(|(_, unit)| unit.hp * 2 <= unit.max_hp)
        .min_by_key(|(cell, unit)| (unit.hp * 100 / unit.max_hp.max(1), cell.scan_key()))
        .map(|(cell, _)| cell)
}
