//! Discrete-time predator/prey simulation on a terrain-restricted grid.

pub mod agent;
mod behavior;
pub mod engine;
pub mod grid;
pub mod location;
pub mod observer;
pub mod rng;
pub mod scenario;
pub mod seeding;
pub mod snapshot;
pub mod species;
pub mod stats;
pub mod terrain;

pub use agent::{Agent, AgentId, DeathCause};
pub use engine::{Engine, EngineBuilder, EngineSettings, RunSummary, StepReport};
pub use grid::Grid;
pub use location::Location;
pub use scenario::{Scenario, ScenarioLoader};
pub use seeding::{ResetError, SeedSpec, Seedling};
pub use species::{Species, SpeciesTable};
pub use terrain::Terrain;
