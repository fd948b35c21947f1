//! Unit archetypes, abilities and the unit record

use serde::{Deserialize, Serialize};

use crate::hex::Cell;

/// Stable index into the battlefield's unit arena
pub type UnitId = usize;

/// Side a unit fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

/// Unit archetype
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Warrior,
    Archer,
    Mage,
    Healer,
    /// Immobile enemy win condition
    Castle,
}

/// Effect parameters carried by an ability
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AbilityEffect {
    /// Base damage plus a flat bonus
    BonusDamage(i32),
    /// Base damage to the target, a fraction of it to each adjacent hostile
    Splash { ratio: f64 },
    /// Fraction of base damage, target loses its next move
    Freeze { ratio: f64 },
    /// Restore a uniform roll in [min, max], clamped to max hp
    Heal { min: i32, max: i32 },
    /// Permanent def bonus, stacks
    Barrier { def_bonus: i32 },
}

/// Named unit ability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    ShieldBash,
    Charge,
    AimedShot,
    Volley,
    Fireball,
    Freeze,
    Heal,
    Barrier,
}

impl Ability {
    pub fn name(self) -> &'static str {
        match self {
            Ability::ShieldBash => "Shield Bash",
            Ability::Charge => "Charge",
            Ability::AimedShot => "Aimed Shot",
            Ability::Volley => "Volley",
            Ability::Fireball => "Fireball",
            Ability::Freeze => "Freeze",
            Ability::Heal => "Heal",
            Ability::Barrier => "Barrier",
        }
    }

    pub fn effect(self) -> AbilityEffect {
        match self {
            Ability::ShieldBash => AbilityEffect::BonusDamage(3),
            Ability::Charge => AbilityEffect::BonusDamage(5),
            Ability::AimedShot => AbilityEffect::BonusDamage(4),
            Ability::Volley => AbilityEffect::Splash { ratio: 0.5 },
            Ability::Fireball => AbilityEffect::BonusDamage(6),
            Ability::Freeze => AbilityEffect::Freeze { ratio: 0.5 },
            Ability::Heal => AbilityEffect::Heal { min: 10, max: 14 },
            Ability::Barrier => AbilityEffect::Barrier { def_bonus: 3 },
        }
    }

    /// Targets living, wounded allies instead of enemies
    pub fn targets_allies(self) -> bool {
        matches!(self.effect(), AbilityEffect::Heal { .. } | AbilityEffect::Barrier { .. })
    }

    /// Extra reach on top of the caster's range
    pub fn range_bonus(self) -> i32 {
        match self {
            Ability::Volley | Ability::Fireball => 1,
            _ => 0,
        }
    }
}

/// Base stats of an archetype
#[derive(Clone, Debug)]
pub struct Archetype {
    pub kind: UnitKind,
    pub name: &'static str,
    pub glyph: char,
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub spd: i32,
    pub range: i32,
    pub move_allowance: u32,
    pub abilities: &'static [Ability],
}

impl Archetype {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        kind: UnitKind,
        name: &'static str,
        glyph: char,
        hp: i32,
        atk: i32,
        def: i32,
        spd: i32,
        range: i32,
        move_allowance: u32,
        abilities: &'static [Ability],
    ) -> Self {
        Self {
            kind,
            name,
            glyph,
            hp,
            atk,
            def,
            spd,
            range,
            move_allowance,
            abilities,
        }
    }
}

/// Castle base stats; hp grows per battle
const CASTLE_BASE_HP: i32 = 40;
const CASTLE_HP_PER_BATTLE: i32 = 15;

/// All archetypes
pub static ARCHETYPES: [Archetype; 5] = [
    Archetype::new(UnitKind::Warrior, "Warrior", 'W', 30, 10, 8, 3, 1, 3, &[Ability::ShieldBash, Ability::Charge]),
    Archetype::new(UnitKind::Archer, "Archer", 'A', 20, 12, 4, 4, 3, 4, &[Ability::AimedShot, Ability::Volley]),
    Archetype::new(UnitKind::Mage, "Mage", 'M', 18, 14, 3, 2, 2, 3, &[Ability::Fireball, Ability::Freeze]),
    Archetype::new(UnitKind::Healer, "Healer", 'H', 22, 5, 5, 3, 2, 3, &[Ability::Heal, Ability::Barrier]),
    Archetype::new(UnitKind::Castle, "Castle", 'C', CASTLE_BASE_HP, 0, 12, 0, 0, 0, &[]),
];

/// The player's fixed squad, in roster order
pub const SQUAD: [UnitKind; 4] = [UnitKind::Warrior, UnitKind::Archer, UnitKind::Mage, UnitKind::Healer];

/// Look up an archetype
pub fn archetype(kind: UnitKind) -> &'static Archetype {
    match kind {
        UnitKind::Warrior => &ARCHETYPES[0],
        UnitKind::Archer => &ARCHETYPES[1],
        UnitKind::Mage => &ARCHETYPES[2],
        UnitKind::Healer => &ARCHETYPES[3],
        UnitKind::Castle => &ARCHETYPES[4],
    }
}

/// A unit in the arena. Dead units stay in the arena with no cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    pub team: Team,
    pub cell: Cell,
    pub hp: i32,
    pub max_hp: i32,
    pub atk: i32,
    pub def: i32,
    pub spd: i32,
    pub range: i32,
    pub move_allowance: u32,
    pub abilities: Vec<Ability>,
    pub alive: bool,
    pub moved: bool,
    pub acted: bool,
    /// Pending stun, consumed by the next flag reset
    pub frozen: bool,
}

impl Unit {
    /// Fresh unit from an archetype
    pub fn new(kind: UnitKind, team: Team, cell: Cell) -> Self {
        let a = archetype(kind);
        Self {
            kind,
            team,
            cell,
            hp: a.hp,
            max_hp: a.hp,
            atk: a.atk,
            def: a.def,
            spd: a.spd,
            range: a.range,
            move_allowance: a.move_allowance,
            abilities: a.abilities.to_vec(),
            alive: true,
            moved: false,
            acted: false,
            frozen: false,
        }
    }

    /// The enemy castle for a battle index; never moves or acts
    pub fn castle(cell: Cell, battle_index: usize) -> Self {
        let hp = CASTLE_BASE_HP + CASTLE_HP_PER_BATTLE * battle_index as i32;
        Self {
            hp,
            max_hp: hp,
            moved: true,
            acted: true,
            ..Self::new(UnitKind::Castle, Team::Enemy, cell)
        }
    }

    pub fn name(&self) -> &'static str {
        archetype(self.kind).name
    }

    pub fn glyph(&self) -> char {
        archetype(self.kind).glyph
    }

    pub fn is_castle(&self) -> bool {
        self.kind == UnitKind::Castle
    }

    pub fn is_wounded(&self) -> bool {
        self.hp < self.max_hp
    }

    /// Both turn slots spent
    pub fn is_done(&self) -> bool {
        self.moved && self.acted
    }

    /// Start-of-turn reset; a pending freeze eats this turn's move
    pub fn reset_turn_flags(&mut self) {
        self.moved = self.frozen;
        self.acted = false;
        self.frozen = false;
    }
}
