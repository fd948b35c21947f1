//! Map command - print a battle's generated board
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_campaign(), build_board(), report_board()
//! - Level 3: render_rows()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use hexcrusade_core::{Battlefield, Campaign, Cell, Team, TerrainKind, COLS, ROWS};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MapArgs {
    /// Battle number (1-based)
    #[arg(long, default_value = "1")]
    pub battle: usize,

    /// Campaign JSON file (defaults to the built-in campaign)
    #[arg(long, value_name = "FILE")]
    pub campaign: Option<PathBuf>,

    /// Output the board as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run map command
pub fn run(args: MapArgs) -> Result<()> {
    let campaign = load_campaign(args.campaign.as_deref())?;
    let field = build_board(&campaign, args.battle)?;
    report_board(&campaign, args.battle, &field, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Built-in campaign, or one read from JSON
pub fn load_campaign(path: Option<&Path>) -> Result<Campaign> {
    match path {
        Some(path) => Campaign::load(path)
            .with_context(|| format!("Failed to load campaign: {}", path.display())),
        None => Ok(Campaign::standard()),
    }
}

/// Set up the battle exactly as a campaign would
fn build_board(campaign: &Campaign, battle: usize) -> Result<Battlefield> {
    if battle == 0 || battle > campaign.len() {
        bail!("battle must be between 1 and {}", campaign.len());
    }
    let index = battle - 1;
    let def = &campaign.battles[index];
    tracing::info!("Generating battle {}: {}", battle, def.name);
    Ok(Battlefield::setup(index, def, 0))
}

fn report_board(campaign: &Campaign, battle: usize, field: &Battlefield, json: bool) -> Result<()> {
    let def = &campaign.battles[battle - 1];
    if json {
        #[derive(serde::Serialize)]
        struct JsonUnit<'a> {
            name: &'a str,
            team: Team,
            col: i32,
            row: i32,
            hp: i32,
        }

        #[derive(serde::Serialize)]
        struct JsonBoard<'a> {
            battle: usize,
            name: &'a str,
            rows: Vec<String>,
            units: Vec<JsonUnit<'a>>,
        }

        let output = JsonBoard {
            battle,
            name: &def.name,
            rows: render_rows(field),
            units: field
                .units()
                .iter()
                .map(|u| JsonUnit {
                    name: u.name(),
                    team: u.team,
                    col: u.cell.col,
                    row: u.cell.row,
                    hp: u.hp,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n=== Battle {}: {} ===", battle, def.name);
    for line in render_rows(field) {
        println!("{}", line);
    }
    println!();
    println!("Legend: . plains  f forest  ^ mountain  ~ water  # castle");
    println!("        W A M H player  w a m h enemy  C castle");
    let counts: Vec<String> = TerrainKind::ALL
        .iter()
        .map(|&kind| format!("{} {}", kind.name(), field.grid.count(kind)))
        .collect();
    println!("Terrain: {}", counts.join(", "));
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// One text line per row; odd rows shifted right half a cell
pub fn render_rows(field: &Battlefield) -> Vec<String> {
    (0..ROWS)
        .map(|row| {
            let mut line = String::new();
            if row % 2 == 1 {
                line.push(' ');
            }
            for col in 0..COLS {
                line.push(cell_glyph(field, Cell::new(col, row)));
                line.push(' ');
            }
            line.trim_end().to_string()
        })
        .collect()
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn cell_glyph(field: &Battlefield, cell: Cell) -> char {
    match field.unit_at(cell).map(|id| field.unit(id)) {
        Some(unit) if unit.is_castle() || unit.team == Team::Player => unit.glyph(),
        Some(unit) => unit.glyph().to_ascii_lowercase(),
        None => field.grid.terrain(cell).glyph(),
    }
}
