//! Battle board: terrain grid plus the unit arena
//!
//! Units live in a `Vec` addressed by `UnitId`; grid tiles hold the id of
//! their occupant. `move_unit` and `remove_from_grid` are the only places
//! that touch both sides, keeping unit cells and tile occupants in sync.

use serde::{Deserialize, Serialize};

use crate::campaign::{BattleDef, PLAYER_SPAWNS};
use crate::grid::Grid;
use crate::hex::Cell;
use crate::terrain::{self, TerrainKind};
use crate::units::{Team, Unit, UnitId, SQUAD};

/// One battle's board state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    pub grid: Grid,
    units: Vec<Unit>,
    castle: Option<UnitId>,
    /// Enemy units killed, running total across the campaign
    pub kills: u32,
}

impl Battlefield {
    /// Empty board over a grid
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            units: Vec::new(),
            castle: None,
            kills: 0,
        }
    }

    /// Build a battle from its definition.
    ///
    /// The roster is rebuilt from scratch: the four squad archetypes at full
    /// strength on their spawn cells, then the enemies, then the castle.
    /// `kills` carries the campaign's running tally.
    pub fn setup(battle_index: usize, def: &BattleDef, kills: u32) -> Self {
        let grid = terrain::generate(battle_index, &def.terrain, def.castle);
        let mut field = Self::new(grid);
        field.kills = kills;

        for (&kind, cell) in SQUAD.iter().zip(PLAYER_SPAWNS) {
            field.spawn(Unit::new(kind, Team::Player, cell));
        }

        for (&kind, cell) in def.enemies.iter().zip(def.enemy_spawns()) {
            field.spawn(Unit::new(kind, Team::Enemy, cell));
        }

        field.spawn_castle(Unit::castle(def.castle, battle_index));
        field
    }

    /// Add a living unit to the arena and its cell
    pub fn spawn(&mut self, unit: Unit) -> UnitId {
        let id = self.units.len();
        let cell = unit.cell;
        debug_assert!(self.grid.occupant(cell).is_none(), "spawn on occupied {}", cell);
        self.units.push(unit);
        self.grid.set_occupant(cell, Some(id));
        id
    }

    /// Add a unit and mark it as the battle's castle
    pub fn spawn_castle(&mut self, unit: Unit) -> UnitId {
        let id = self.spawn(unit);
        self.castle = Some(id);
        id
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id]
    }

    /// Full roster, dead units included
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Ids of living units of a team, in roster order
    pub fn living(&self, team: Team) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(move |(_, u)| u.alive && u.team == team)
            .map(|(id, _)| id)
    }

    pub fn living_count(&self, team: Team) -> usize {
        self.living(team).count()
    }

    /// Living unit standing on a cell
    pub fn unit_at(&self, cell: Cell) -> Option<UnitId> {
        self.grid.get(cell)?.occupant.filter(|&id| self.units[id].alive)
    }

    pub fn castle(&self) -> Option<UnitId> {
        self.castle
    }

    /// Castle missing or destroyed
    pub fn castle_fallen(&self) -> bool {
        self.castle.map_or(true, |id| !self.units[id].alive)
    }

    /// Terrain under a unit
    pub fn terrain_under(&self, id: UnitId) -> TerrainKind {
        self.grid.terrain(self.units[id].cell)
    }

    /// Move a unit, updating both its cell and the tiles
    pub fn move_unit(&mut self, id: UnitId, to: Cell) {
        let from = self.units[id].cell;
        debug_assert!(self.grid.occupant(to).is_none(), "move onto occupied {}", to);
        self.grid.set_occupant(from, None);
        self.grid.set_occupant(to, Some(id));
        let unit = &mut self.units[id];
        unit.cell = to;
        unit.moved = true;
    }

    /// Vacate a dead unit's tile; the unit stays in the roster
    pub(crate) fn remove_from_grid(&mut self, id: UnitId) {
        let cell = self.units[id].cell;
        if self.grid.occupant(cell) == Some(id) {
            self.grid.set_occupant(cell, None);
        }
    }

    /// Reset per-turn flags for a team's living units
    pub fn reset_team_flags(&mut self, team: Team) {
        for unit in self.units.iter_mut().filter(|u| u.alive && u.team == team) {
            unit.reset_turn_flags();
        }
    }

    /// Every living player unit has moved and acted
    pub fn all_players_done(&self) -> bool {
        self.units
            .iter()
            .filter(|u| u.alive && u.team == Team::Player)
            .all(Unit::is_done)
    }

    /// Player units, living or not
    pub fn squad(&self) -> Vec<Unit> {
        self.units.iter().filter(|u| u.team == Team::Player).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::Campaign;
    use crate::units::UnitKind;

    #[test]
    fn test_setup_standard_battle() {
        let campaign = Campaign::standard();
        let field = Battlefield::setup(0, &campaign.battles[0], 0);

        assert_eq!(field.units().len(), 4 + 3 + 1);
        assert_eq!(field.living_count(Team::Player), 4);
        assert_eq!(field.living_count(Team::Enemy), 4);

        let castle = field.castle().unwrap();
        assert!(field.unit(castle).is_castle());
        assert_eq!(field.unit_at(Cell::new(15, 2)), Some(castle));
        assert_eq!(field.grid.terrain(Cell::new(15, 2)), TerrainKind::Castle);
    }

    #[test]
    fn test_unit_cells_match_tiles() {
        let campaign = Campaign::standard();
        let field = Battlefield::setup(2, &campaign.battles[2], 0);
        for (id, unit) in field.units().iter().enumerate() {
            assert_eq!(field.grid.occupant(unit.cell), Some(id));
        }
    }

    #[test]
    fn test_move_unit_updates_both_sides() {
        let mut field = Battlefield::new(Grid::default());
        let id = field.spawn(Unit::new(UnitKind::Warrior, Team::Player, Cell::new(2, 2)));
        field.move_unit(id, Cell::new(3, 2));

        assert_eq!(field.unit(id).cell, Cell::new(3, 2));
        assert!(field.unit(id).moved);
        assert_eq!(field.grid.occupant(Cell::new(2, 2)), None);
        assert_eq!(field.grid.occupant(Cell::new(3, 2)), Some(id));
    }

    #[test]
    fn test_next_battle_gets_fresh_squad() {
        let campaign = Campaign::standard();
        let mut first = Battlefield::setup(0, &campaign.battles[0], 0);
        first.unit_mut(1).alive = false;
        first.unit_mut(1).hp = 0;
        first.remove_from_grid(1);
        first.unit_mut(0).def += 3;
        first.unit_mut(2).hp = 4;

        let second = Battlefield::setup(1, &campaign.battles[1], 2);
        assert_eq!(second.kills, 2);
        assert_eq!(second.living_count(Team::Player), 4);
        for (id, kind) in SQUAD.iter().enumerate() {
            let unit = second.unit(id);
            assert_eq!(unit.kind, *kind);
            assert!(unit.alive);
            assert_eq!(unit.hp, unit.max_hp);
            assert_eq!(second.unit_at(PLAYER_SPAWNS[id]), Some(id));
        }
        assert_eq!(second.unit(0).def, 8);
    }

    #[test]
    fn test_castle_fallen() {
        let mut field = Battlefield::new(Grid::default());
        assert!(field.castle_fallen());
        let id = field.spawn_castle(Unit::castle(Cell::new(15, 2), 0));
        assert!(!field.castle_fallen());
        field.unit_mut(id).alive = false;
        assert!(field.castle_fallen());
    }
}
