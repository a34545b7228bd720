use serde::Serialize;

use crate::grid::Grid;
use crate::stats::SpeciesCounts;

/// Serializable summary of the field after a tick.
#[derive(Clone, Debug, Serialize)]
pub struct FieldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub depth: usize,
    pub width: usize,
    pub population: usize,
    pub counts: SpeciesCounts,
    pub viable: bool,
}

impl FieldSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// One line per row: species glyph where occupied, terrain glyph otherwise,
/// blank for unset cells.
pub fn render_text(grid: &Grid) -> String {
    let mut out = String::with_capacity(grid.depth() * (grid.width() + 1));
    for loc in grid.locations() {
        let glyph = match (grid.get(loc), grid.terrain_at(loc)) {
            (Some(occupant), _) => occupant.species.glyph(),
            (None, Some(terrain)) => terrain.glyph(),
            (None, None) => ' ',
        };
        out.push(glyph);
        if loc.col + 1 == grid.width() {
            out.push('\n');
        }
    }
    out
}
