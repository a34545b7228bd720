use rand::Rng;

use super::TickContext;
use crate::agent::Agent;
use crate::rng::{RngExt, SimRng};
use crate::species::SpeciesConfig;

/// Number of offspring this tick: 0 below breeding age or on a failed draw,
/// otherwise uniform in `[1, max_litter_size]`.
pub(super) fn litter_size(agent: &Agent, config: &SpeciesConfig, rng: &mut SimRng) -> u32 {
    if agent.age() < config.breeding_age || !rng.chance(config.breeding_probability) {
        return 0;
    }
    rng.gen_range(1..=config.max_litter_size)
}

/// Place offspring around the parent's pre-tick cell. Births with no usable
/// cell are dropped. Returns how many were placed.
pub(super) fn breed(parent: &Agent, config: &SpeciesConfig, ctx: &mut TickContext<'_>) -> u32 {
    let litter = litter_size(parent, config, ctx.rng);
    let mut placed = 0;
    for _ in 0..litter {
        let Some(cell) = ctx.write.random_free_neighbor(parent.location(), ctx.rng) else {
            continue;
        };
        if !ctx.write.accepts(cell, parent.species()) {
            continue;
        }
        let newborn = Agent::new(
            ctx.population.allocate_id(),
            parent.species(),
            cell,
            0,
            config.food_cap,
        );
        ctx.write.place(newborn.occupant(), cell);
        ctx.newborns.push(newborn);
        placed += 1;
    }
    placed
}
