//! Battle definitions and the campaign they form

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CampaignError;
use crate::hex::{Cell, COLS, ROWS};
use crate::terrain::TerrainProfile;
use crate::units::UnitKind;

/// Player squad spawn cells, matching `units::SQUAD` order
pub const PLAYER_SPAWNS: [Cell; 4] = [Cell::new(0, 3), Cell::new(0, 6), Cell::new(1, 4), Cell::new(1, 7)];

/// Enemy rows are spread over this many rows starting at `ENEMY_FIRST_ROW`
const ENEMY_ROW_SPREAD: usize = 10;
const ENEMY_FIRST_ROW: i32 = 2;

/// Static configuration of one battle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleDef {
    pub name: String,
    /// Enemy roster in spawn order (castle excluded)
    pub enemies: Vec<UnitKind>,
    pub castle: Cell,
    #[serde(default)]
    pub terrain: TerrainProfile,
}

impl BattleDef {
    pub fn new(name: &str, enemies: &[UnitKind], castle: Cell, terrain: TerrainProfile) -> Self {
        Self {
            name: name.to_string(),
            enemies: enemies.to_vec(),
            castle,
            terrain,
        }
    }

    /// Spawn cells for the enemy roster, staggered over the two rightmost columns
    pub fn enemy_spawns(&self) -> Vec<Cell> {
        let n = self.enemies.len();
        if n == 0 {
            return Vec::new();
        }
        let step = (ENEMY_ROW_SPREAD / n) as i32;
        (0..n)
            .map(|i| {
                let row = (ENEMY_FIRST_ROW + i as i32 * step).min(ROWS - 1);
                let col = COLS - 2 + (i % 2) as i32;
                Cell::new(col, row)
            })
            .collect()
    }
}

/// An ordered list of battles played back to back
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub battles: Vec<BattleDef>,
}

impl Default for Campaign {
    fn default() -> Self {
        Self::standard()
    }
}

impl Campaign {
    /// The three built-in battles
    pub fn standard() -> Self {
        use UnitKind::*;
        Self {
            name: "Hex Crusade".to_string(),
            battles: vec![
                BattleDef::new(
                    "Border Outpost",
                    &[Warrior, Warrior, Archer],
                    Cell::new(15, 2),
                    TerrainProfile::new(0.22, 0.38, None),
                ),
                BattleDef::new(
                    "Forest Stronghold",
                    &[Warrior, Archer, Mage, Warrior],
                    Cell::new(15, 1),
                    TerrainProfile::new(0.18, 0.45, Some(0.82)),
                ),
                BattleDef::new(
                    "Dark Fortress",
                    &[Warrior, Warrior, Archer, Mage, Healer],
                    Cell::new(15, 2),
                    TerrainProfile::new(0.15, 0.30, Some(0.72)),
                ),
            ],
        }
    }

    pub fn battle(&self, index: usize) -> Option<&BattleDef> {
        self.battles.get(index)
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    /// Index of the final battle
    pub fn last_index(&self) -> usize {
        self.battles.len().saturating_sub(1)
    }

    /// Check every battle can be set up
    pub fn validate(&self) -> Result<(), CampaignError> {
        if self.battles.is_empty() {
            return Err(CampaignError::Empty);
        }

        for (battle, def) in self.battles.iter().enumerate() {
            if !def.castle.is_valid() {
                return Err(CampaignError::CastleOutOfBounds { battle, cell: def.castle });
            }
            if def.enemies.contains(&UnitKind::Castle) {
                return Err(CampaignError::CastleInRoster { battle });
            }
            if def.enemies.len() > ENEMY_ROW_SPREAD {
                return Err(CampaignError::TooManyEnemies {
                    battle,
                    count: def.enemies.len(),
                    max: ENEMY_ROW_SPREAD,
                });
            }
            let spawns = def.enemy_spawns();
            if PLAYER_SPAWNS.contains(&def.castle) || spawns.contains(&def.castle) {
                return Err(CampaignError::CastleOnSpawn { battle, cell: def.castle });
            }
            let t = &def.terrain;
            if t.water_below > t.forest_below || t.mountain_above.is_some_and(|m| m < t.forest_below) {
                return Err(CampaignError::BadTerrainProfile { battle });
            }
        }

        Ok(())
    }

    /// Load and validate a campaign from a JSON file
    pub fn load(path: &Path) -> Result<Self, CampaignError> {
        let content = std::fs::read_to_string(path).map_err(|source| CampaignError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let campaign: Campaign = serde_json::from_str(&content)?;
        campaign.validate()?;
        Ok(campaign)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), CampaignError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| CampaignError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_campaign_is_valid() {
        let campaign = Campaign::standard();
        assert_eq!(campaign.len(), 3);
        assert!(campaign.validate().is_ok());
        assert_eq!(campaign.last_index(), 2);
    }

    #[test]
    fn test_enemy_spawns() {
        let campaign = Campaign::standard();
        let spawns = campaign.battles[0].enemy_spawns();
        assert_eq!(spawns, vec![Cell::new(14, 2), Cell::new(15, 5), Cell::new(14, 8)]);

        let spawns = campaign.battles[2].enemy_spawns();
        assert_eq!(spawns.len(), 5);
        assert_eq!(spawns[4], Cell::new(14, 10));
    }

    #[test]
    fn test_validate_rejects_bad_castle() {
        let mut campaign = Campaign::standard();
        campaign.battles[0].castle = Cell::new(16, 2);
        assert!(matches!(campaign.validate(), Err(CampaignError::CastleOutOfBounds { battle: 0, .. })));

        campaign.battles[0].castle = Cell::new(14, 2);
        assert!(matches!(campaign.validate(), Err(CampaignError::CastleOnSpawn { battle: 0, .. })));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let campaign = Campaign {
            name: "none".into(),
            battles: vec![],
        };
        assert!(matches!(campaign.validate(), Err(CampaignError::Empty)));
    }

    #[test]
    fn test_json_roundtrip_with_default_terrain() {
        let json = r#"{
            "name": "short",
            "battles": [
                { "name": "Skirmish", "enemies": ["warrior"], "castle": { "col": 15, "row": 6 } }
            ]
        }"#;
        let campaign: Campaign = serde_json::from_str(json).unwrap();
        assert!(campaign.validate().is_ok());
        assert_eq!(campaign.battles[0].terrain, TerrainProfile::default());
    }
}
