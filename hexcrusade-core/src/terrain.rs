//! Terrain kinds and the seeded noise terrain generator

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::hex::{Cell, COLS};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Octaves sampled per cell
const OCTAVES: u32 = 3;

/// Lattice scale applied to (col, row) before sampling
const SAMPLE_SCALE: f64 = 0.35;

/// Seed offset between octaves
const OCTAVE_SEED_STEP: f64 = 97.0;

/// Number of cosmetic tile variants
const VARIANTS: i64 = 3;

/// Columns kept clear on each flank for spawning
const SPAWN_LANE_WIDTH: i32 = 2;

// ============================================================================
// TERRAIN TABLE
// ============================================================================

/// Terrain kind of a grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    #[default]
    Plains,
    Forest,
    Mountain,
    Water,
    Castle,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 5] = [
        TerrainKind::Plains,
        TerrainKind::Forest,
        TerrainKind::Mountain,
        TerrainKind::Water,
        TerrainKind::Castle,
    ];

    /// Movement points to enter, `None` when impassable
    pub fn move_cost(self) -> Option<u32> {
        match self {
            TerrainKind::Plains => Some(1),
            TerrainKind::Forest => Some(2),
            TerrainKind::Mountain => Some(3),
            TerrainKind::Water => None,
            TerrainKind::Castle => Some(1),
        }
    }

    /// Multiplier applied to the defender's def
    pub fn defense_multiplier(self) -> f64 {
        match self {
            TerrainKind::Plains => 1.0,
            TerrainKind::Forest => 1.3,
            TerrainKind::Mountain => 1.5,
            TerrainKind::Water => 1.0,
            TerrainKind::Castle => 1.8,
        }
    }

    pub fn is_passable(self) -> bool {
        self.move_cost().is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            TerrainKind::Plains => "Plains",
            TerrainKind::Forest => "Forest",
            TerrainKind::Mountain => "Mountain",
            TerrainKind::Water => "Water",
            TerrainKind::Castle => "Castle",
        }
    }

    /// Single-character map glyph
    pub fn glyph(self) -> char {
        match self {
            TerrainKind::Plains => '.',
            TerrainKind::Forest => 'f',
            TerrainKind::Mountain => '^',
            TerrainKind::Water => '~',
            TerrainKind::Castle => '#',
        }
    }
}

/// Noise cutoffs that turn the noise field into terrain
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    /// Noise below this is water
    pub water_below: f64,
    /// Noise below this (and not water) is forest
    pub forest_below: f64,
    /// Noise above this is mountain
    #[serde(default)]
    pub mountain_above: Option<f64>,
}

impl TerrainProfile {
    pub const fn new(water_below: f64, forest_below: f64, mountain_above: Option<f64>) -> Self {
        Self {
            water_below,
            forest_below,
            mountain_above,
        }
    }

    /// Classify a normalized noise sample
    pub fn classify(&self, n: f64) -> TerrainKind {
        if n < self.water_below {
            TerrainKind::Water
        } else if n < self.forest_below {
            TerrainKind::Forest
        } else if self.mountain_above.is_some_and(|m| n > m) {
            TerrainKind::Mountain
        } else {
            TerrainKind::Plains
        }
    }
}

impl Default for TerrainProfile {
    fn default() -> Self {
        Self::new(0.22, 0.38, None)
    }
}

// ============================================================================
// NOISE
// ============================================================================

/// Hashed lattice value in [0, 1)
fn lattice_hash(x: f64, y: f64, seed: f64) -> f64 {
    let n = (x * 127.1 + y * 311.7 + seed * 53.3).sin() * 43758.5453;
    n - n.floor()
}

/// Smoothstep-weighted bilinear interpolation of the four surrounding lattice points
fn smooth_noise(x: f64, y: f64, seed: f64) -> f64 {
    let ix = x.floor();
    let iy = y.floor();
    let fx = x - ix;
    let fy = y - iy;
    let fx = fx * fx * (3.0 - 2.0 * fx);
    let fy = fy * fy * (3.0 - 2.0 * fy);

    let a = lattice_hash(ix, iy, seed);
    let b = lattice_hash(ix + 1.0, iy, seed);
    let c = lattice_hash(ix, iy + 1.0, seed);
    let d = lattice_hash(ix + 1.0, iy + 1.0, seed);

    a + (b - a) * fx + (c - a) * fy + (a - b - c + d) * fx * fy
}

/// Fractal value noise normalized by total amplitude
pub fn fractal_noise(x: f64, y: f64, seed: f64, octaves: u32) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut total = 0.0;

    for octave in 0..octaves {
        let octave_seed = seed + f64::from(octave) * OCTAVE_SEED_STEP;
        value += smooth_noise(x * frequency, y * frequency, octave_seed) * amplitude;
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    value / total
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Seed for a battle index
pub fn battle_seed(battle_index: usize) -> i64 {
    battle_index as i64 * 1000 + 42
}

/// Generate the terrain grid for a battle (pure function of its inputs)
pub fn generate(battle_index: usize, profile: &TerrainProfile, castle: Cell) -> Grid {
    let seed = battle_seed(battle_index);
    let mut grid = Grid::default();

    for cell in crate::hex::all_cells() {
        let n = fractal_noise(
            f64::from(cell.col) * SAMPLE_SCALE,
            f64::from(cell.row) * SAMPLE_SCALE,
            seed as f64,
            OCTAVES,
        );

        let terrain = if cell.col < SPAWN_LANE_WIDTH || cell.col >= COLS - SPAWN_LANE_WIDTH {
            TerrainKind::Plains
        } else {
            profile.classify(n)
        };

        let variant = (i64::from(cell.col) * 7 + i64::from(cell.row) * 13 + seed).rem_euclid(VARIANTS) as u8;
        grid.set_terrain(cell, terrain, variant);
    }

    grid.set_terrain(castle, TerrainKind::Castle, 0);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::{all_cells, ROWS};

    #[test]
    fn test_terrain_table() {
        assert_eq!(TerrainKind::Plains.move_cost(), Some(1));
        assert_eq!(TerrainKind::Mountain.move_cost(), Some(3));
        assert!(!TerrainKind::Water.is_passable());
        assert_eq!(TerrainKind::Castle.defense_multiplier(), 1.8);
    }

    #[test]
    fn test_classify_cutoffs() {
        let profile = TerrainProfile::new(0.15, 0.30, Some(0.72));
        assert_eq!(profile.classify(0.10), TerrainKind::Water);
        assert_eq!(profile.classify(0.20), TerrainKind::Forest);
        assert_eq!(profile.classify(0.50), TerrainKind::Plains);
        assert_eq!(profile.classify(0.80), TerrainKind::Mountain);

        let flat = TerrainProfile::new(0.22, 0.38, None);
        assert_eq!(flat.classify(0.99), TerrainKind::Plains);
    }

    #[test]
    fn test_noise_range() {
        for cell in all_cells() {
            let n = fractal_noise(cell.col as f64 * 0.35, cell.row as f64 * 0.35, 42.0, 3);
            assert!((0.0..1.0).contains(&n), "noise {} out of range", n);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let profile = TerrainProfile::new(0.18, 0.45, Some(0.82));
        let castle = Cell::new(15, 1);
        let a = generate(1, &profile, castle);
        let b = generate(1, &profile, castle);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_battles_differ() {
        let profile = TerrainProfile::default();
        let castle = Cell::new(15, 2);
        assert_ne!(generate(0, &profile, castle), generate(2, &profile, castle));
    }

    #[test]
    fn test_spawn_lanes_and_castle() {
        let profile = TerrainProfile::new(0.9, 0.95, None); // almost all water
        let castle = Cell::new(15, 2);
        let grid = generate(0, &profile, castle);

        for row in 0..ROWS {
            for col in [0, 1, COLS - 2, COLS - 1] {
                let cell = Cell::new(col, row);
                let expected = if cell == castle { TerrainKind::Castle } else { TerrainKind::Plains };
                assert_eq!(grid.terrain(cell), expected, "{}", cell);
            }
        }
        assert_eq!(grid.tile(castle).variant, 0);
    }
}
