//! Terrain variants, the occupancy permission table, and terrain layouts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::rng::{RngExt, SimRng};
use crate::species::Species;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Mountain,
    Savanna,
    Refuge,
    Plains,
}

impl Terrain {
    /// May `species` occupy a cell of this terrain?
    pub fn can_enter(self, species: Species) -> bool {
        match self {
            Terrain::Mountain => species != Species::Lion,
            Terrain::Savanna => matches!(species, Species::Human | Species::Lion),
            Terrain::Refuge => species == Species::Rabbit,
            Terrain::Plains => true,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Terrain::Mountain => '^',
            Terrain::Savanna => '"',
            Terrain::Refuge => 'o',
            Terrain::Plains => '.',
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Terrain::Mountain => "mountain",
            Terrain::Savanna => "savanna",
            Terrain::Refuge => "refuge",
            Terrain::Plains => "plains",
        };
        f.write_str(name)
    }
}

/// Permission check for a possibly unset cell. Unset terrain admits nobody.
pub fn admits(terrain: Option<Terrain>, species: Species) -> bool {
    terrain.is_some_and(|t| t.can_enter(species))
}

/// Chooses the terrain installed at each cell when a field is laid out.
pub trait TerrainLayout {
    fn terrain_at(&self, loc: Location, depth: usize, width: usize, rng: &mut SimRng) -> Terrain;
}

impl<F> TerrainLayout for F
where
    F: Fn(Location) -> Terrain,
{
    fn terrain_at(&self, loc: Location, _depth: usize, _width: usize, _rng: &mut SimRng) -> Terrain {
        self(loc)
    }
}

/// Mountains along the top edge, a savanna belt, plains dotted with refuges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedLayout {
    #[serde(default = "default_mountain_rows")]
    pub mountain_rows: usize,
    #[serde(default = "default_savanna_start")]
    pub savanna_start: usize,
    #[serde(default = "default_savanna_end")]
    pub savanna_end: usize,
    #[serde(default = "default_refuge_probability")]
    pub refuge_probability: f64,
}

fn default_mountain_rows() -> usize {
    5
}

fn default_savanna_start() -> usize {
    20
}

fn default_savanna_end() -> usize {
    35
}

fn default_refuge_probability() -> f64 {
    0.01
}

impl Default for BandedLayout {
    fn default() -> Self {
        Self {
            mountain_rows: default_mountain_rows(),
            savanna_start: default_savanna_start(),
            savanna_end: default_savanna_end(),
            refuge_probability: default_refuge_probability(),
        }
    }
}

impl TerrainLayout for BandedLayout {
    fn terrain_at(&self, loc: Location, _depth: usize, _width: usize, rng: &mut SimRng) -> Terrain {
        if loc.row < self.mountain_rows {
            Terrain::Mountain
        } else if (self.savanna_start..=self.savanna_end).contains(&loc.row) {
            Terrain::Savanna
        } else if rng.unit() < self.refuge_probability {
            Terrain::Refuge
        } else {
            Terrain::Plains
        }
    }
}

/// The same terrain everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLayout(pub Terrain);

impl TerrainLayout for UniformLayout {
    fn terrain_at(&self, _loc: Location, _depth: usize, _width: usize, _rng: &mut SimRng) -> Terrain {
        self.0
    }
}

/// Scenario-level choice of layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainLayoutConfig {
    Banded(BandedLayout),
    Uniform { terrain: Terrain },
}

impl Default for TerrainLayoutConfig {
    fn default() -> Self {
        TerrainLayoutConfig::Banded(BandedLayout::default())
    }
}

impl TerrainLayoutConfig {
    pub fn build(&self) -> Box<dyn TerrainLayout> {
        match self {
            TerrainLayoutConfig::Banded(layout) => Box::new(layout.clone()),
            TerrainLayoutConfig::Uniform { terrain } => Box::new(UniformLayout(*terrain)),
        }
    }
}
