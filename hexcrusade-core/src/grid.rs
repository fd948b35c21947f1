//! Battle grid: terrain plus unit occupancy per cell

use serde::{Deserialize, Serialize};

use crate::hex::{Cell, COLS, ROWS};
use crate::terrain::TerrainKind;
use crate::units::UnitId;

/// A single grid cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: TerrainKind,
    /// Cosmetic sprite variant
    pub variant: u8,
    /// Unit standing here (index into the unit arena)
    pub occupant: Option<UnitId>,
}

/// Row-major COLS x ROWS grid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    tiles: Vec<Tile>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::filled(TerrainKind::Plains)
    }
}

impl Grid {
    /// Grid with every cell set to one terrain
    pub fn filled(terrain: TerrainKind) -> Self {
        let tile = Tile {
            terrain,
            ..Tile::default()
        };
        Self {
            tiles: vec![tile; (COLS * ROWS) as usize],
        }
    }

    fn index(cell: Cell) -> usize {
        debug_assert!(cell.is_valid(), "cell {} off grid", cell);
        (cell.row * COLS + cell.col) as usize
    }

    /// Tile at a valid cell
    pub fn tile(&self, cell: Cell) -> &Tile {
        &self.tiles[Self::index(cell)]
    }

    /// Tile at any cell, `None` off grid
    pub fn get(&self, cell: Cell) -> Option<&Tile> {
        cell.is_valid().then(|| self.tile(cell))
    }

    pub fn terrain(&self, cell: Cell) -> TerrainKind {
        self.tile(cell).terrain
    }

    pub fn occupant(&self, cell: Cell) -> Option<UnitId> {
        self.tile(cell).occupant
    }

    pub fn set_terrain(&mut self, cell: Cell, terrain: TerrainKind, variant: u8) {
        let tile = &mut self.tiles[Self::index(cell)];
        tile.terrain = terrain;
        tile.variant = variant;
    }

    pub(crate) fn set_occupant(&mut self, cell: Cell, occupant: Option<UnitId>) {
        self.tiles[Self::index(cell)].occupant = occupant;
    }

    /// Count cells of a terrain kind
    pub fn count(&self, terrain: TerrainKind) -> usize {
        self.tiles.iter().filter(|t| t.terrain == terrain).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_grid() {
        let grid = Grid::filled(TerrainKind::Forest);
        assert_eq!(grid.count(TerrainKind::Forest), (COLS * ROWS) as usize);
        assert_eq!(grid.occupant(Cell::new(3, 3)), None);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let grid = Grid::default();
        assert!(grid.get(Cell::new(-1, 0)).is_none());
        assert!(grid.get(Cell::new(0, ROWS)).is_none());
        assert!(grid.get(Cell::new(COLS - 1, ROWS - 1)).is_some());
    }

    #[test]
    fn test_set_terrain_and_occupant() {
        let mut grid = Grid::default();
        let cell = Cell::new(4, 7);
        grid.set_terrain(cell, TerrainKind::Water, 2);
        grid.set_occupant(cell, Some(3));
        assert_eq!(grid.terrain(cell), TerrainKind::Water);
        assert_eq!(grid.tile(cell).variant, 2);
        assert_eq!(grid.occupant(cell), Some(3));
    }
}
