use super::{hunting, TickContext};
use crate::agent::{Agent, DeathCause};
use crate::location::Location;
use crate::species::{Species, SpeciesConfig};
use crate::terrain::Terrain;

/// Pick the agent's cell in the write buffer and claim it, or kill it for
/// overcrowding when nothing is left.
pub(super) fn resolve(agent: &mut Agent, config: &SpeciesConfig, ctx: &mut TickContext<'_>) {
    let origin = agent.location();
    let species = agent.species();
    let sheltered = species.is_prey() && ctx.read.terrain_at(origin) == Some(Terrain::Refuge);

    let moved = if sheltered {
        None
    } else {
        let kill_site = if config.is_predator() {
            hunting::hunt(agent, config, ctx)
        } else {
            None
        };
        let preferred = match kill_site {
            Some(site) => ctx.write.open_for(site, species).then_some(site),
            None if config.flees_predators => escape_route(origin, species, ctx),
            None => None,
        };
        preferred.or_else(|| ctx.write.first_open_neighbor(origin, species))
    };

    let destination = moved.or_else(|| ctx.write.open_for(origin, species).then_some(origin));
    match destination {
        Some(cell) => {
            agent.location = cell;
            ctx.write.place(agent.occupant(), cell);
        }
        None => agent.kill(DeathCause::Overcrowding),
    }
}

/// When a hunter of `species` is adjacent, the first neighbor that is open in
/// the write buffer and has no hunter on or around it in the read buffer.
fn escape_route(origin: Location, species: Species, ctx: &TickContext<'_>) -> Option<Location> {
    let read = ctx.read;
    let hunted_at = |cell: Location| {
        read.get(cell).is_some_and(|occupant| {
            ctx.species.preys_on(occupant.species, species) && ctx.population.is_alive(occupant.id)
        })
    };

    if !read.neighbor_iter(origin).any(hunted_at) {
        return None;
    }
    read.neighbor_iter(origin).find(|&cell| {
        ctx.write.open_for(cell, species)
            && !hunted_at(cell)
            && !read.neighbor_iter(cell).any(hunted_at)
    })
}

#[cfg(test)]
mod tests {
    use crate::agent::DeathCause;
    use crate::behavior::test_support::Field;
    use crate::grid::Occupant;
    use crate::location::Location;
    use crate::species::Species;
    use crate::terrain::Terrain;

    fn block(field: &mut Field, loc: Location) {
        let id = field.population.allocate_id();
        field.write.place(
            Occupant {
                id,
                species: Species::Human,
            },
            loc,
        );
    }

    #[test]
    fn test_rabbit_escapes_to_safe_cell() {
        let mut field = Field::plains(5, 5);
        let rabbit = field.add(Species::Rabbit, Location::new(2, 2), 0, None);
        field.add(Species::Fox, Location::new(1, 1), 0, Some(10));

        field.act(rabbit);

        assert_eq!(field.agent(rabbit).location(), Location::new(1, 3));
    }

    #[test]
    fn test_no_threat_uses_fallback() {
        let mut field = Field::plains(5, 5);
        let rabbit = field.add(Species::Rabbit, Location::new(2, 2), 0, None);
        // A lion out of reach is no threat.
        field.add(Species::Lion, Location::new(4, 4), 0, Some(10));

        field.act(rabbit);

        assert_eq!(field.agent(rabbit).location(), Location::new(1, 1));
    }

    #[test]
    fn test_escape_picks_first_cell_clear_of_hunters() {
        let mut field = Field::plains(3, 3);
        let rabbit = field.add(Species::Rabbit, Location::new(1, 1), 0, None);
        field.add(Species::Fox, Location::new(0, 0), 0, Some(10));

        field.act(rabbit);

        assert_eq!(field.agent(rabbit).location(), Location::new(0, 2));
    }

    #[test]
    fn test_escape_without_safe_cell_falls_back() {
        let mut field = Field::plains(2, 2);
        let rabbit = field.add(Species::Rabbit, Location::new(0, 0), 0, None);
        field.add(Species::Fox, Location::new(1, 1), 0, Some(10));

        field.act(rabbit);

        // Every cell of a 2x2 field touches the fox.
        assert_eq!(field.agent(rabbit).location(), Location::new(0, 1));
    }

    #[test]
    fn test_refuge_rabbit_stays_put() {
        let mut field = Field::plains(3, 3);
        let home = Location::new(1, 1);
        field.set_terrain(home, Terrain::Refuge);
        let rabbit = field.add(Species::Rabbit, home, 0, None);
        field.add(Species::Fox, Location::new(0, 0), 0, Some(10));

        field.act(rabbit);

        let rabbit = field.agent(rabbit);
        assert!(rabbit.is_alive());
        assert_eq!(rabbit.location(), home);
        assert_eq!(field.write.get(home).map(|o| o.id), Some(rabbit.id()));
    }

    #[test]
    fn test_refuge_rabbit_dies_when_cell_taken() {
        let mut field = Field::plains(3, 3);
        let home = Location::new(1, 1);
        field.set_terrain(home, Terrain::Refuge);
        let rabbit = field.add(Species::Rabbit, home, 0, None);
        let id = field.population.allocate_id();
        field.write.place(
            Occupant {
                id,
                species: Species::Rabbit,
            },
            home,
        );

        field.act(rabbit);

        assert_eq!(
            field.agent(rabbit).cause_of_death(),
            Some(DeathCause::Overcrowding)
        );
    }

    #[test]
    fn test_overcrowding_when_boxed_in() {
        let mut field = Field::plains(1, 2);
        let fox = field.add(Species::Fox, Location::new(0, 0), 0, Some(10));
        block(&mut field, Location::new(0, 0));
        block(&mut field, Location::new(0, 1));

        field.act(fox);

        let fox = field.agent(fox);
        assert!(!fox.is_alive());
        assert_eq!(fox.cause_of_death(), Some(DeathCause::Overcrowding));
    }

    #[test]
    fn test_stays_when_neighbors_taken() {
        let mut field = Field::plains(1, 2);
        let fox = field.add(Species::Fox, Location::new(0, 0), 0, Some(10));
        block(&mut field, Location::new(0, 1));

        field.act(fox);

        let fox = field.agent(fox);
        assert!(fox.is_alive());
        assert_eq!(fox.location(), Location::new(0, 0));
    }

    #[test]
    fn test_lion_avoids_mountain() {
        let mut field = Field::plains(2, 2);
        field.set_terrain(Location::new(0, 1), Terrain::Mountain);
        field.set_terrain(Location::new(1, 0), Terrain::Mountain);
        let lion = field.add(Species::Lion, Location::new(0, 0), 0, Some(30));

        field.act(lion);

        assert_eq!(field.agent(lion).location(), Location::new(1, 1));
    }
}
