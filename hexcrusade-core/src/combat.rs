//! Combat resolution: damage formula, abilities, unit death

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::units::{Ability, AbilityEffect, Team, UnitId};

/// Lower bound of the damage variance draw
const VARIANCE_MIN: f64 = 0.9;
/// Width of the damage variance draw
const VARIANCE_SPAN: f64 = 0.2;

// ============================================================================
// DICE
// ============================================================================

/// Source of combat randomness
#[derive(Clone, Debug)]
pub enum Dice {
    /// Seeded stream
    Seeded(ChaCha8Rng),
    /// Constant draws for reproducible tests
    Fixed { factor: f64, heal: i32 },
}

impl Dice {
    pub fn seeded(seed: u64) -> Self {
        Dice::Seeded(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Dice::Seeded(ChaCha8Rng::from_entropy())
    }

    pub fn fixed(factor: f64, heal: i32) -> Self {
        Dice::Fixed { factor, heal }
    }

    /// Damage multiplier in [0.9, 1.1)
    pub fn damage_factor(&mut self) -> f64 {
        match self {
            Dice::Seeded(rng) => VARIANCE_MIN + rng.gen::<f64>() * VARIANCE_SPAN,
            Dice::Fixed { factor, .. } => *factor,
        }
    }

    /// Uniform integer in [min, max]
    pub fn heal_amount(&mut self, min: i32, max: i32) -> i32 {
        match self {
            Dice::Seeded(rng) => rng.gen_range(min..=max),
            Dice::Fixed { heal, .. } => (*heal).clamp(min, max),
        }
    }
}

// ============================================================================
// DAMAGE
// ============================================================================

/// `max(1, floor((atk - def * multiplier) * factor))`
pub fn damage_formula(atk: i32, def: i32, defense_multiplier: f64, factor: f64) -> i32 {
    let raw = f64::from(atk) - f64::from(def) * defense_multiplier;
    ((raw * factor).floor() as i32).max(1)
}

/// Roll base damage from attacker to defender, using the defender's terrain
pub fn calc_damage(field: &Battlefield, attacker: UnitId, defender: UnitId, dice: &mut Dice) -> i32 {
    let multiplier = field.terrain_under(defender).defense_multiplier();
    damage_formula(
        field.unit(attacker).atk,
        field.unit(defender).def,
        multiplier,
        dice.damage_factor(),
    )
}

/// What a single hit did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub target: UnitId,
    pub damage: i32,
    pub killed: bool,
}

/// Subtract hp, clamp at 0; at 0 the unit dies and leaves the grid
pub fn apply_damage(field: &mut Battlefield, target: UnitId, damage: i32) -> Hit {
    let unit = field.unit_mut(target);
    unit.hp = (unit.hp - damage).max(0);

    let killed = unit.hp == 0 && unit.alive;
    if killed {
        unit.alive = false;
        let team = unit.team;
        tracing::debug!(unit = target, "{} defeated", field.unit(target).name());
        field.remove_from_grid(target);
        if team == Team::Enemy {
            field.kills += 1;
        }
    }

    Hit { target, damage, killed }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Result of an attack or ability
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReport {
    pub hits: Vec<Hit>,
    pub healed: i32,
    pub def_gained: i32,
    pub froze: bool,
}

/// Basic attack; spends the attacker's action
pub fn attack(field: &mut Battlefield, attacker: UnitId, target: UnitId, dice: &mut Dice) -> ActionReport {
    let damage = calc_damage(field, attacker, target, dice);
    let hit = apply_damage(field, target, damage);
    field.unit_mut(attacker).acted = true;

    tracing::debug!(attacker, defender = target, damage, "attack");
    ActionReport {
        hits: vec![hit],
        ..ActionReport::default()
    }
}

/// Resolve an ability on a target; spends the caster's action
pub fn use_ability(
    field: &mut Battlefield,
    caster: UnitId,
    target: UnitId,
    ability: Ability,
    dice: &mut Dice,
) -> ActionReport {
    field.unit_mut(caster).acted = true;
    let mut report = ActionReport::default();

    match ability.effect() {
        AbilityEffect::BonusDamage(bonus) => {
            let damage = calc_damage(field, caster, target, dice) + bonus;
            report.hits.push(apply_damage(field, target, damage));
        }
        AbilityEffect::Splash { ratio } => {
            let damage = calc_damage(field, caster, target, dice);
            let centre = field.unit(target).cell;
            report.hits.push(apply_damage(field, target, damage));

            let splash = (f64::from(damage) * ratio).floor() as i32;
            let caster_team = field.unit(caster).team;
            let adjacent: Vec<UnitId> = centre
                .neighbors()
                .filter_map(|cell| field.unit_at(cell))
                .filter(|&id| field.unit(id).team != caster_team)
                .collect();
            for id in adjacent {
                report.hits.push(apply_damage(field, id, splash));
            }
        }
        AbilityEffect::Freeze { ratio } => {
            let damage = (f64::from(calc_damage(field, caster, target, dice)) * ratio).floor() as i32;
            report.hits.push(apply_damage(field, target, damage));
            let unit = field.unit_mut(target);
            unit.moved = true;
            unit.frozen = true;
            report.froze = true;
        }
        AbilityEffect::Heal { min, max } => {
            let amount = dice.heal_amount(min, max);
            let unit = field.unit_mut(target);
            let before = unit.hp;
            unit.hp = (unit.hp + amount).min(unit.max_hp);
            report.healed = unit.hp - before;
        }
        AbilityEffect::Barrier { def_bonus } => {
            field.unit_mut(target).def += def_bonus;
            report.def_gained = def_bonus;
        }
    }

    tracing::debug!(caster, recipient = target, ability = ability.name(), "ability");
    report
}
