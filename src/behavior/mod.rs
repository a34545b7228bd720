//! Per-agent tick behavior.
//!
//! Every live agent runs the same pipeline once per tick: aging, hunger,
//! breeding, then movement (hunting, escape, fallback, stay-or-die). Agents
//! observe the field through the read buffer and only ever write their own
//! move and their own offspring into the write buffer.

mod aging;
mod breeding;
mod hunting;
mod movement;

use tracing::trace;

use crate::agent::{Agent, Population};
use crate::grid::Grid;
use crate::rng::SimRng;
use crate::species::SpeciesTable;

/// Everything one agent may touch while it acts.
pub(crate) struct TickContext<'a> {
    /// Pre-tick snapshot; never mutated during a tick.
    pub read: &'a Grid,
    pub write: &'a mut Grid,
    pub population: &'a mut Population,
    pub newborns: &'a mut Vec<Agent>,
    pub species: &'a SpeciesTable,
    pub rng: &'a mut SimRng,
}

/// Run one tick for the agent stored at `slot`. Dead agents are skipped.
pub(crate) fn act(slot: usize, ctx: &mut TickContext<'_>) {
    let mut agent = *ctx.population.at(slot);
    if !agent.is_alive() {
        return;
    }
    let table = ctx.species;
    let config = table.get(agent.species());

    match aging::advance(&mut agent, config) {
        Some(cause) => agent.kill(cause),
        None => {
            let born = breeding::breed(&agent, config, ctx);
            if born > 0 {
                trace!(parent = %agent.species(), at = %agent.location(), born, "litter");
            }
            movement::resolve(&mut agent, config, ctx);
        }
    }

    *ctx.population.at_mut(slot) = agent;
}
