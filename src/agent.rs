//! Agents and the population list that owns them.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::grid::Occupant;
use crate::location::Location;
use crate::rng::SimRng;
use crate::species::Species;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    OldAge,
    Starvation,
    Predation,
    Overcrowding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) species: Species,
    pub(crate) age: u32,
    pub(crate) alive: bool,
    pub(crate) location: Location,
    pub(crate) food_level: Option<u32>,
    pub(crate) cause_of_death: Option<DeathCause>,
}

impl Agent {
    pub(crate) fn new(
        id: AgentId,
        species: Species,
        location: Location,
        age: u32,
        food_level: Option<u32>,
    ) -> Self {
        Self {
            id,
            species,
            age,
            alive: true,
            location,
            food_level,
            cause_of_death: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Current food level; `None` for species that do not hunt.
    pub fn food_level(&self) -> Option<u32> {
        self.food_level
    }

    pub fn cause_of_death(&self) -> Option<DeathCause> {
        self.cause_of_death
    }

    pub(crate) fn occupant(&self) -> Occupant {
        Occupant {
            id: self.id,
            species: self.species,
        }
    }

    /// First cause wins; dead agents stay dead.
    pub(crate) fn kill(&mut self, cause: DeathCause) {
        if self.alive {
            self.alive = false;
            self.cause_of_death = Some(cause);
        }
    }
}

/// Insertion-ordered agent list with id lookup.
#[derive(Debug, Default, Clone)]
pub struct Population {
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
    next_id: u64,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn push(&mut self, agent: Agent) {
        self.index.insert(agent.id, self.agents.len());
        self.agents.push(agent);
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&slot| &self.agents[slot])
    }

    pub(crate) fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let slot = *self.index.get(&id)?;
        self.agents.get_mut(slot)
    }

    pub(crate) fn at(&self, slot: usize) -> &Agent {
        &self.agents[slot]
    }

    pub(crate) fn at_mut(&mut self, slot: usize) -> &mut Agent {
        &mut self.agents[slot]
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn is_alive(&self, id: AgentId) -> bool {
        self.get(id).is_some_and(Agent::is_alive)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Drop dead agents, keeping the survivors' relative order. Returns the removed.
    pub(crate) fn retain_alive(&mut self) -> Vec<Agent> {
        let (alive, dead): (Vec<Agent>, Vec<Agent>) =
            self.agents.drain(..).partition(Agent::is_alive);
        self.agents = alive;
        self.rebuild_index();
        dead
    }

    pub(crate) fn shuffle(&mut self, rng: &mut SimRng) {
        self.agents.shuffle(rng);
        self.rebuild_index();
    }

    /// Forget every agent and restart id allocation.
    pub(crate) fn clear(&mut self) {
        self.agents.clear();
        self.index.clear();
        self.next_id = 0;
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (slot, agent) in self.agents.iter().enumerate() {
            self.index.insert(agent.id, slot);
        }
    }
}
