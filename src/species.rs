//! Species tags and the per-species rule table.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of simulated species, one per trophic tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Prey tier.
    Rabbit,
    /// Mid-tier predator.
    Fox,
    /// Apex predator.
    Lion,
    /// Second apex tier, hunts lions.
    Human,
}

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Rabbit,
        Species::Fox,
        Species::Lion,
        Species::Human,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Species::Rabbit => "rabbit",
            Species::Fox => "fox",
            Species::Lion => "lion",
            Species::Human => "human",
        }
    }

    pub fn is_prey(self) -> bool {
        matches!(self, Species::Rabbit)
    }

    pub fn glyph(self) -> char {
        match self {
            Species::Rabbit => 'R',
            Species::Fox => 'F',
            Species::Lion => 'L',
            Species::Human => 'H',
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of a predator's diet: what it eats and what eating it is worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietEntry {
    pub species: Species,
    pub feed_value: u32,
}

impl DietEntry {
    pub const fn new(species: Species, feed_value: u32) -> Self {
        Self {
            species,
            feed_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub max_age: u32,
    pub breeding_age: u32,
    pub breeding_probability: f64,
    pub max_litter_size: u32,
    /// Upper bound on food level; `None` for species that never hunt.
    #[serde(default)]
    pub food_cap: Option<u32>,
    /// Prey in preference order.
    #[serde(default)]
    pub diet: Vec<DietEntry>,
    #[serde(default)]
    pub flees_predators: bool,
}

impl SpeciesConfig {
    pub fn rabbit() -> Self {
        Self {
            max_age: 50,
            breeding_age: 5,
            breeding_probability: 0.15,
            max_litter_size: 5,
            food_cap: None,
            diet: Vec::new(),
            flees_predators: true,
        }
    }

    pub fn fox() -> Self {
        Self {
            max_age: 150,
            breeding_age: 8,
            breeding_probability: 0.18,
            max_litter_size: 3,
            food_cap: Some(20),
            diet: vec![DietEntry::new(Species::Rabbit, 12)],
            flees_predators: false,
        }
    }

    pub fn lion() -> Self {
        Self {
            max_age: 180,
            breeding_age: 18,
            breeding_probability: 0.10,
            max_litter_size: 2,
            food_cap: Some(60),
            diet: vec![
                DietEntry::new(Species::Fox, 14),
                DietEntry::new(Species::Rabbit, 6),
            ],
            flees_predators: false,
        }
    }

    pub fn human() -> Self {
        Self {
            max_age: 100,
            breeding_age: 20,
            breeding_probability: 0.05,
            max_litter_size: 2,
            food_cap: Some(10),
            diet: vec![
                DietEntry::new(Species::Lion, 10),
                DietEntry::new(Species::Fox, 7),
                DietEntry::new(Species::Rabbit, 3),
            ],
            flees_predators: false,
        }
    }

    pub fn is_predator(&self) -> bool {
        !self.diet.is_empty()
    }

    pub fn eats(&self, species: Species) -> bool {
        self.diet.iter().any(|entry| entry.species == species)
    }

    pub fn feed_value(&self, species: Species) -> Option<u32> {
        self.diet
            .iter()
            .find(|entry| entry.species == species)
            .map(|entry| entry.feed_value)
    }

    fn validate(&self, species: Species) -> Result<(), SpeciesError> {
        if self.max_age == 0 {
            return Err(SpeciesError::ZeroMaxAge(species));
        }
        if self.max_litter_size == 0 {
            return Err(SpeciesError::ZeroLitter(species));
        }
        if !(0.0..=1.0).contains(&self.breeding_probability) {
            return Err(SpeciesError::BreedingProbability {
                species,
                value: self.breeding_probability,
            });
        }
        match self.food_cap {
            Some(0) => return Err(SpeciesError::ZeroFoodCap(species)),
            None if self.is_predator() => return Err(SpeciesError::MissingFoodCap(species)),
            _ => {}
        }
        if let Some(entry) = self.diet.iter().find(|entry| entry.feed_value == 0) {
            return Err(SpeciesError::ZeroFeedValue {
                hunter: species,
                prey: entry.species,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SpeciesError {
    #[error("{0}: max_age must be greater than zero")]
    ZeroMaxAge(Species),
    #[error("{0}: max_litter_size must be greater than zero")]
    ZeroLitter(Species),
    #[error("{species}: breeding_probability {value} must be between 0.0 and 1.0")]
    BreedingProbability { species: Species, value: f64 },
    #[error("{0}: food_cap must be greater than zero")]
    ZeroFoodCap(Species),
    #[error("{0}: a species with a diet needs a food_cap")]
    MissingFoodCap(Species),
    #[error("{hunter}: feed value for {prey} must be greater than zero")]
    ZeroFeedValue { hunter: Species, prey: Species },
}

/// Rule records for every species, keyed by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    #[serde(default = "SpeciesConfig::rabbit")]
    pub rabbit: SpeciesConfig,
    #[serde(default = "SpeciesConfig::fox")]
    pub fox: SpeciesConfig,
    #[serde(default = "SpeciesConfig::lion")]
    pub lion: SpeciesConfig,
    #[serde(default = "SpeciesConfig::human")]
    pub human: SpeciesConfig,
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            rabbit: SpeciesConfig::rabbit(),
            fox: SpeciesConfig::fox(),
            lion: SpeciesConfig::lion(),
            human: SpeciesConfig::human(),
        }
    }
}

impl SpeciesTable {
    pub fn get(&self, species: Species) -> &SpeciesConfig {
        match species {
            Species::Rabbit => &self.rabbit,
            Species::Fox => &self.fox,
            Species::Lion => &self.lion,
            Species::Human => &self.human,
        }
    }

    pub fn get_mut(&mut self, species: Species) -> &mut SpeciesConfig {
        match species {
            Species::Rabbit => &mut self.rabbit,
            Species::Fox => &mut self.fox,
            Species::Lion => &mut self.lion,
            Species::Human => &mut self.human,
        }
    }

    /// True when `hunter` has `prey` anywhere in its diet.
    pub fn preys_on(&self, hunter: Species, prey: Species) -> bool {
        self.get(hunter).eats(prey)
    }

    pub fn validate(&self) -> Result<(), SpeciesError> {
        for species in Species::ALL {
            self.get(species).validate(species)?;
        }
        Ok(())
    }
}
