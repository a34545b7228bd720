use tracing::trace;

use super::TickContext;
use crate::agent::{Agent, DeathCause};
use crate::location::Location;
use crate::species::SpeciesConfig;

/// Eat the first living neighbor that matches the diet, tried in preference
/// order against the read buffer. Returns the kill site.
pub(super) fn hunt(
    hunter: &mut Agent,
    config: &SpeciesConfig,
    ctx: &mut TickContext<'_>,
) -> Option<Location> {
    let cap = config.food_cap?;
    let read = ctx.read;

    for entry in &config.diet {
        let target = read.neighbor_iter(hunter.location()).find_map(|cell| {
            read.get(cell)
                .filter(|occupant| {
                    occupant.species == entry.species && ctx.population.is_alive(occupant.id)
                })
                .map(|occupant| (cell, occupant))
        });

        let Some((site, prey)) = target else {
            continue;
        };
        if let Some(victim) = ctx.population.get_mut(prey.id) {
            victim.kill(DeathCause::Predation);
        }
        hunter.food_level = Some(entry.feed_value.min(cap));
        trace!(
            hunter = %hunter.species(),
            prey = %prey.species,
            at = %site,
            food = entry.feed_value.min(cap),
            "kill"
        );
        return Some(site);
    }
    None
}
