use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    agent::{Agent, AgentId, DeathCause, Population},
    behavior::{self, TickContext},
    grid::Grid,
    location::Location,
    observer::{StepObserver, TracingObserver},
    rng::{RngExt, SimRng},
    scenario::{Scenario, ScenarioError},
    seeding::{ProbabilitySeeder, ResetError, SeedSpec, Seedling, SeedingProvider},
    snapshot::FieldSnapshot,
    species::{SpeciesError, SpeciesTable},
    stats::{PopulationStats, SpeciesCounts},
    terrain::{BandedLayout, TerrainLayout},
};

pub const DEFAULT_DEPTH: usize = 50;
pub const DEFAULT_WIDTH: usize = 50;

#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub depth: usize,
    pub width: usize,
    pub species: SpeciesTable,
}

impl EngineSettings {
    pub fn new(scenario_name: impl Into<String>, seed: u64) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            seed,
            depth: DEFAULT_DEPTH,
            width: DEFAULT_WIDTH,
            species: SpeciesTable::default(),
        }
    }

    pub fn with_dimensions(mut self, depth: usize, width: usize) -> Self {
        self.depth = depth;
        self.width = width;
        self
    }

    pub fn with_species(mut self, species: SpeciesTable) -> Self {
        self.species = species;
        self
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    layout: Box<dyn TerrainLayout>,
    observers: Vec<Box<dyn StepObserver>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            layout: Box::new(BandedLayout::default()),
            observers: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: impl TerrainLayout + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    pub fn with_observer(mut self, observer: impl StepObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn push_observer(&mut self, observer: impl StepObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Lay out terrain for an empty field. Call [`Engine::reset`] or
    /// [`Engine::spawn`] to put agents on it.
    pub fn build(self) -> Result<Engine, SpeciesError> {
        self.settings.species.validate()?;
        let mut settings = self.settings;
        if settings.depth == 0 || settings.width == 0 {
            warn!(
                depth = settings.depth,
                width = settings.width,
                "field dimensions must be positive, using {DEFAULT_DEPTH}x{DEFAULT_WIDTH}"
            );
            settings.depth = DEFAULT_DEPTH;
            settings.width = DEFAULT_WIDTH;
        }

        let mut engine = Engine {
            read: Grid::new(settings.depth, settings.width),
            write: Grid::new(settings.depth, settings.width),
            population: Population::new(),
            newborns: Vec::new(),
            stats: PopulationStats::new(),
            rng: SimRng::new(settings.seed),
            tick: 0,
            layout: self.layout,
            observers: self.observers,
            settings,
        };
        engine.lay_terrain();
        Ok(engine)
    }
}

/// Deaths removed at the end of a tick, by cause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeathTally {
    pub old_age: usize,
    pub starvation: usize,
    pub predation: usize,
    pub overcrowding: usize,
}

impl DeathTally {
    fn record(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::OldAge => self.old_age += 1,
            DeathCause::Starvation => self.starvation += 1,
            DeathCause::Predation => self.predation += 1,
            DeathCause::Overcrowding => self.overcrowding += 1,
        }
    }

    fn absorb(&mut self, other: &DeathTally) {
        self.old_age += other.old_age;
        self.starvation += other.starvation;
        self.predation += other.predation;
        self.overcrowding += other.overcrowding;
    }

    pub fn total(&self) -> usize {
        self.old_age + self.starvation + self.predation + self.overcrowding
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub tick: u64,
    pub births: usize,
    pub deaths: DeathTally,
    pub population: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_tick: u64,
    pub births: usize,
    pub deaths: DeathTally,
    pub population: usize,
    pub viable: bool,
}

impl RunSummary {
    fn absorb(&mut self, report: &StepReport) {
        self.ticks_run += 1;
        self.final_tick = report.tick;
        self.births += report.births;
        self.deaths.absorb(&report.deaths);
        self.population = report.population;
    }
}

pub struct Engine {
    settings: EngineSettings,
    layout: Box<dyn TerrainLayout>,
    observers: Vec<Box<dyn StepObserver>>,
    /// Authoritative field between ticks.
    read: Grid,
    write: Grid,
    population: Population,
    newborns: Vec<Agent>,
    stats: PopulationStats,
    rng: SimRng,
    tick: u64,
}

impl Engine {
    /// Build and seed an engine from a validated scenario.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let (depth, width) = scenario.field.dimensions();
        let settings = EngineSettings::new(scenario.name.clone(), scenario.seed)
            .with_dimensions(depth, width)
            .with_species(scenario.species.clone());

        let mut builder = EngineBuilder::new(settings);
        builder.layout = scenario.terrain.build();
        if scenario.logging.report_interval > 0 {
            builder.push_observer(TracingObserver::new(scenario.logging.report_interval));
        }
        let mut engine = builder.build()?;
        engine.reset(scenario.seed, &scenario.spawn)?;
        Ok(engine)
    }

    /// Advance one tick.
    pub fn step(&mut self) -> StepReport {
        self.tick += 1;
        self.newborns.clear();

        let mut ctx = TickContext {
            read: &self.read,
            write: &mut self.write,
            population: &mut self.population,
            newborns: &mut self.newborns,
            species: &self.settings.species,
            rng: &mut self.rng,
        };
        for slot in 0..ctx.population.len() {
            behavior::act(slot, &mut ctx);
        }

        let births = self.newborns.len();
        for newborn in self.newborns.drain(..) {
            self.population.push(newborn);
        }
        let mut deaths = DeathTally::default();
        for dead in self.population.retain_alive() {
            if let Some(cause) = dead.cause_of_death() {
                deaths.record(cause);
            }
        }
        let population = &self.population;
        self.write
            .retain_occupants(|occupant| population.contains(occupant.id));

        std::mem::swap(&mut self.read, &mut self.write);
        self.write.clear_occupancy();
        self.stats.invalidate();

        let report = StepReport {
            tick: self.tick,
            births,
            deaths,
            population: self.population.len(),
        };
        debug!(
            tick = report.tick,
            births,
            old_age = deaths.old_age,
            starvation = deaths.starvation,
            predation = deaths.predation,
            overcrowding = deaths.overcrowding,
            population = report.population,
            "step"
        );
        self.notify();
        report
    }

    /// Run exactly `ticks` steps.
    pub fn run(&mut self, ticks: u64) -> RunSummary {
        self.drive(ticks, false, |_| {})
    }

    /// Run exactly `ticks` steps, handing a snapshot to `hook` after each.
    pub fn run_with_hook<F>(&mut self, ticks: u64, hook: F) -> RunSummary
    where
        F: FnMut(&FieldSnapshot),
    {
        self.drive(ticks, false, hook)
    }

    /// Step until `max_ticks` have run or the field stops being viable,
    /// whichever comes first. Viability is checked before every step.
    pub fn run_while_viable(&mut self, max_ticks: u64) -> RunSummary {
        self.drive(max_ticks, true, |_| {})
    }

    pub fn run_while_viable_with_hook<F>(&mut self, max_ticks: u64, hook: F) -> RunSummary
    where
        F: FnMut(&FieldSnapshot),
    {
        self.drive(max_ticks, true, hook)
    }

    fn drive<F>(&mut self, max_ticks: u64, stop_when_unviable: bool, mut hook: F) -> RunSummary
    where
        F: FnMut(&FieldSnapshot),
    {
        let mut summary = RunSummary::default();
        while summary.ticks_run < max_ticks {
            if stop_when_unviable && !self.is_viable() {
                break;
            }
            let report = self.step();
            summary.absorb(&report);
            hook(&self.snapshot());
        }
        self.finish(summary)
    }

    fn finish(&self, mut summary: RunSummary) -> RunSummary {
        summary.final_tick = self.tick;
        summary.population = self.population.len();
        summary.viable = self.is_viable();
        info!(
            scenario = %self.settings.scenario_name,
            ticks = summary.ticks_run,
            tick = summary.final_tick,
            population = summary.population,
            viable = summary.viable,
            "run finished"
        );
        summary
    }

    /// Re-lay terrain and seed a fresh population from spawn probabilities.
    /// Invalid spawn probabilities are rejected before anything changes.
    pub fn reset(&mut self, seed: u64, spec: &SeedSpec) -> Result<(), ResetError> {
        spec.validate()?;
        self.reset_with(seed, &ProbabilitySeeder::new(spec.clone()));
        Ok(())
    }

    pub fn reset_with(&mut self, seed: u64, seeder: &dyn SeedingProvider) {
        self.settings.seed = seed;
        self.rng.reseed(seed);
        self.tick = 0;
        self.population.clear();
        self.newborns.clear();
        self.read.clear_occupancy();
        self.write.clear_occupancy();
        self.lay_terrain();

        let cells: Vec<Location> = self.read.locations().collect();
        for loc in cells {
            let draw = self.rng.unit();
            let Some(seedling) = seeder.seed_cell(loc, draw, &self.settings.species, &mut self.rng)
            else {
                continue;
            };
            if self.read.open_for(loc, seedling.species) {
                self.insert(seedling, loc);
            }
        }
        self.population.shuffle(&mut self.rng);
        self.stats.invalidate();

        info!(
            scenario = %self.settings.scenario_name,
            seed,
            population = self.population.len(),
            counts = %self.counts(),
            "field reset"
        );
        self.notify();
    }

    /// Add one agent between ticks. Returns `None` when the cell is taken or
    /// its terrain rejects the species.
    pub fn spawn(&mut self, seedling: Seedling, loc: Location) -> Option<AgentId> {
        if !self.read.contains(loc) || !self.read.open_for(loc, seedling.species) {
            return None;
        }
        let id = self.insert(seedling, loc);
        self.stats.invalidate();
        Some(id)
    }

    fn insert(&mut self, seedling: Seedling, loc: Location) -> AgentId {
        let cap = self.settings.species.get(seedling.species).food_cap;
        let food_level = match (seedling.food_level, cap) {
            (Some(food), Some(cap)) => Some(food.min(cap)),
            (_, cap) => cap,
        };
        let agent = Agent::new(
            self.population.allocate_id(),
            seedling.species,
            loc,
            seedling.age,
            food_level,
        );
        self.read.place(agent.occupant(), loc);
        self.population.push(agent);
        agent.id()
    }

    fn lay_terrain(&mut self) {
        let (depth, width) = (self.read.depth(), self.read.width());
        let cells: Vec<Location> = self.read.locations().collect();
        for loc in cells {
            let terrain = self.layout.terrain_at(loc, depth, width, &mut self.rng);
            self.read.set_terrain_at(loc, terrain);
        }
        self.write.copy_terrain_from(&self.read);
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer.on_step(self.tick, &self.read);
        }
    }

    pub fn tick_number(&self) -> u64 {
        self.tick
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn seed(&self) -> u64 {
        self.settings.seed
    }

    pub fn species_table(&self) -> &SpeciesTable {
        &self.settings.species
    }

    /// Independent copy of the live agents, in population order.
    pub fn population_snapshot(&self) -> Vec<Agent> {
        self.population.iter().copied().collect()
    }

    pub fn population_len(&self) -> usize {
        self.population.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.population.get(id)
    }

    pub fn counts(&self) -> &SpeciesCounts {
        self.stats.counts(&self.read)
    }

    pub fn is_viable(&self) -> bool {
        self.stats.is_viable(&self.read)
    }

    /// The authoritative field.
    pub fn field(&self) -> &Grid {
        &self.read
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let counts = self.counts().clone();
        FieldSnapshot {
            scenario: self.settings.scenario_name.clone(),
            tick: self.tick,
            depth: self.read.depth(),
            width: self.read.width(),
            population: self.population.len(),
            viable: counts.is_viable(),
            counts,
        }
    }
}
