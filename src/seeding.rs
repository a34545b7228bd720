//! Initial population seeding.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::Location;
use crate::rng::SimRng;
use crate::species::{Species, SpeciesConfig, SpeciesTable};

fn default_human() -> f64 {
    0.01
}

fn default_lion() -> f64 {
    0.005
}

fn default_fox() -> f64 {
    0.02
}

fn default_rabbit() -> f64 {
    0.08
}

/// Per-cell spawn probabilities, checked cumulatively in the order
/// human, lion, fox, rabbit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedSpec {
    #[serde(default = "default_human")]
    pub human: f64,
    #[serde(default = "default_lion")]
    pub lion: f64,
    #[serde(default = "default_fox")]
    pub fox: f64,
    #[serde(default = "default_rabbit")]
    pub rabbit: f64,
}

impl Default for SeedSpec {
    fn default() -> Self {
        Self {
            human: default_human(),
            lion: default_lion(),
            fox: default_fox(),
            rabbit: default_rabbit(),
        }
    }
}

impl SeedSpec {
    /// No agents at all.
    pub fn empty() -> Self {
        Self {
            human: 0.0,
            lion: 0.0,
            fox: 0.0,
            rabbit: 0.0,
        }
    }

    pub fn probability(&self, species: Species) -> f64 {
        match species {
            Species::Human => self.human,
            Species::Lion => self.lion,
            Species::Fox => self.fox,
            Species::Rabbit => self.rabbit,
        }
    }

    pub fn set_probability(&mut self, species: Species, value: f64) {
        match species {
            Species::Human => self.human = value,
            Species::Lion => self.lion = value,
            Species::Fox => self.fox = value,
            Species::Rabbit => self.rabbit = value,
        }
    }

    fn ordered(&self) -> [(Species, f64); 4] {
        [
            (Species::Human, self.human),
            (Species::Lion, self.lion),
            (Species::Fox, self.fox),
            (Species::Rabbit, self.rabbit),
        ]
    }

    pub fn validate(&self) -> Result<(), ResetError> {
        for (species, value) in self.ordered() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResetError::ProbabilityOutOfRange { species, value });
            }
        }
        let total: f64 = self.ordered().iter().map(|(_, value)| value).sum();
        if total > 1.0 {
            return Err(ResetError::ProbabilityOverflow { total });
        }
        Ok(())
    }

    /// Species selected by a `[0, 1)` draw, if any. Zero-probability
    /// species are never selected.
    pub fn pick(&self, draw: f64) -> Option<Species> {
        let mut threshold = 0.0;
        for (species, value) in self.ordered() {
            if value <= 0.0 {
                continue;
            }
            threshold += value;
            if draw <= threshold {
                return Some(species);
            }
        }
        None
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ResetError {
    #[error("spawn probability for {species} is {value}, expected a value between 0.0 and 1.0")]
    ProbabilityOutOfRange { species: Species, value: f64 },
    #[error("spawn probabilities sum to {total}, which exceeds 1.0")]
    ProbabilityOverflow { total: f64 },
}

/// An agent the seeder wants created; the engine decides whether it fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seedling {
    pub species: Species,
    pub age: u32,
    pub food_level: Option<u32>,
}

impl Seedling {
    /// Newborn-style seedling: age 0 and a full stomach.
    pub fn new(species: Species, config: &SpeciesConfig) -> Self {
        Self {
            species,
            age: 0,
            food_level: config.food_cap,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_food(mut self, food_level: Option<u32>) -> Self {
        self.food_level = food_level;
        self
    }

    /// Random age in `[0, max_age)` and, for hunters, a food level around
    /// the upper part of the cap.
    pub fn random(species: Species, config: &SpeciesConfig, rng: &mut SimRng) -> Self {
        let age = rng.gen_range(0..config.max_age);
        let food_level = config
            .food_cap
            .map(|cap| (rng.gen_range(0..cap) + cap / 4).min(cap).max(1));
        Self {
            species,
            age,
            food_level,
        }
    }
}

/// Decides what, if anything, starts on a cell at reset.
pub trait SeedingProvider {
    fn seed_cell(
        &self,
        loc: Location,
        draw: f64,
        species: &SpeciesTable,
        rng: &mut SimRng,
    ) -> Option<Seedling>;
}

/// Draw-against-probability seeding with randomized starting ages.
#[derive(Debug, Clone, Default)]
pub struct ProbabilitySeeder {
    spec: SeedSpec,
}

impl ProbabilitySeeder {
    pub fn new(spec: SeedSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &SeedSpec {
        &self.spec
    }
}

impl SeedingProvider for ProbabilitySeeder {
    fn seed_cell(
        &self,
        _loc: Location,
        draw: f64,
        species: &SpeciesTable,
        rng: &mut SimRng,
    ) -> Option<Seedling> {
        let chosen = self.spec.pick(draw)?;
        Some(Seedling::random(chosen, species.get(chosen), rng))
    }
}
