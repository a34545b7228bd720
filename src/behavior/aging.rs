use crate::agent::{Agent, DeathCause};
use crate::species::SpeciesConfig;

/// Age the agent and burn one unit of food. Returns the cause if either kills it.
pub(super) fn advance(agent: &mut Agent, config: &SpeciesConfig) -> Option<DeathCause> {
    grow_older(agent, config).or_else(|| burn_food(agent))
}

fn grow_older(agent: &mut Agent, config: &SpeciesConfig) -> Option<DeathCause> {
    agent.age = agent.age.saturating_add(1);
    (agent.age > config.max_age).then_some(DeathCause::OldAge)
}

fn burn_food(agent: &mut Agent) -> Option<DeathCause> {
    let food = agent.food_level.as_mut()?;
    *food = food.saturating_sub(1);
    (*food == 0).then_some(DeathCause::Starvation)
}
