//! Hex grid geometry with odd-row offset coordinates

use serde::{Deserialize, Serialize};

/// Grid width in columns
pub const COLS: i32 = 16;

/// Grid height in rows
pub const ROWS: i32 = 12;

/// Neighbor offsets (dc, dr) for even rows
const EVEN_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (-1, 0), (-1, -1), (0, -1), (-1, 1), (0, 1)];

/// Neighbor offsets (dc, dr) for odd rows (shifted half a hex right)
const ODD_ROW_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, -1), (1, -1), (0, 1), (1, 1)];

/// Offset hex coordinates (odd rows shoved right)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Check if this cell is on the grid
    pub fn is_valid(&self) -> bool {
        self.col >= 0 && self.col < COLS && self.row >= 0 && self.row < ROWS
    }

    /// Axial/cube components (x, y, z) with x + y + z == 0
    fn cube(&self) -> (i32, i32, i32) {
        let x = self.col - self.row.div_euclid(2);
        let z = self.row;
        (x, -x - z, z)
    }

    /// Hex steps between two cells
    pub fn distance_to(&self, other: Cell) -> i32 {
        let (x1, y1, z1) = self.cube();
        let (x2, y2, z2) = other.cube();
        (x1 - x2).abs().max((y1 - y2).abs()).max((z1 - z2).abs())
    }

    /// In-bounds adjacent cells
    pub fn neighbors(&self) -> impl Iterator<Item = Cell> {
        let origin = *self;
        let dirs = if self.row & 1 == 1 {
            &ODD_ROW_DIRECTIONS
        } else {
            &EVEN_ROW_DIRECTIONS
        };
        dirs.iter()
            .map(move |&(dc, dr)| Cell::new(origin.col + dc, origin.row + dr))
            .filter(Cell::is_valid)
    }

    /// Row-major ordering key
    pub fn scan_key(&self) -> (i32, i32) {
        (self.row, self.col)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// Up to 6 in-bounds neighbors of (col, row)
pub fn neighbors(col: i32, row: i32) -> Vec<Cell> {
    Cell::new(col, row).neighbors().collect()
}

/// Hex distance between (c1, r1) and (c2, r2)
pub fn distance(c1: i32, r1: i32, c2: i32, r2: i32) -> i32 {
    Cell::new(c1, r1).distance_to(Cell::new(c2, r2))
}

/// Every grid cell in row-major order
pub fn all_cells() -> impl Iterator<Item = Cell> {
    (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Cell::new(col, row)))
}
