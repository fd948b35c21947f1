//! Reachable-cell search and target enumeration

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::battlefield::Battlefield;
use crate::hex::{all_cells, Cell};
use crate::units::UnitId;

/// Cells a unit can end its move on, with the cheapest cost found for each
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reachable {
    costs: FxHashMap<Cell, u32>,
}

impl Reachable {
    pub fn contains(&self, cell: Cell) -> bool {
        self.costs.contains_key(&cell)
    }

    /// Minimum movement cost to reach a cell
    pub fn cost(&self, cell: Cell) -> Option<u32> {
        self.costs.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Cells in row-major order
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.costs.keys().copied().collect();
        cells.sort_by_key(Cell::scan_key);
        cells
    }
}

/// Cost-bounded flood fill from a unit's cell.
///
/// A cell is re-expanded whenever a cheaper path to it turns up, so queue
/// order never hides a cheaper route. Impassable and occupied cells are never
/// entered; the unit's own cell is not part of the result.
pub fn reachable(field: &Battlefield, id: UnitId) -> Reachable {
    let unit = field.unit(id);
    let start = unit.cell;
    let budget = unit.move_allowance;

    let mut best: FxHashMap<Cell, u32> = FxHashMap::default();
    let mut queue = VecDeque::new();
    best.insert(start, 0);
    queue.push_back((start, 0u32));

    while let Some((cell, cost)) = queue.pop_front() {
        // Stale entry, a cheaper path was already expanded
        if best.get(&cell).is_some_and(|&b| b < cost) {
            continue;
        }

        for next in cell.neighbors() {
            let tile = field.grid.tile(next);
            let Some(step) = tile.terrain.move_cost() else {
                continue;
            };
            if tile.occupant.is_some() {
                continue;
            }
            let total = cost + step;
            if total > budget {
                continue;
            }
            if best.get(&next).map_or(true, |&b| total < b) {
                best.insert(next, total);
                queue.push_back((next, total));
            }
        }
    }

    best.remove(&start);
    Reachable { costs: best }
}

/// Living opposing units within `range` of the unit, row-major
pub fn hostile_targets(field: &Battlefield, id: UnitId, range: i32) -> Vec<Cell> {
    let unit = field.unit(id);
    scan_targets(field, unit.cell, range, |other| other.team != unit.team)
}

/// Living, wounded allies (self included) within `range`, row-major
pub fn friendly_targets(field: &Battlefield, id: UnitId, range: i32) -> Vec<Cell> {
    let unit = field.unit(id);
    scan_targets(field, unit.cell, range, |other| other.team == unit.team && other.is_wounded())
}

fn scan_targets(
    field: &Battlefield,
    origin: Cell,
    range: i32,
    accept: impl Fn(&crate::units::Unit) -> bool,
) -> Vec<Cell> {
    all_cells()
        .filter(|&cell| origin.distance_to(cell) <= range)
        .filter(|&cell| field.unit_at(cell).is_some_and(|other| accept(field.unit(other))))
        .collect()
}
