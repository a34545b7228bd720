//! Step observers: external sinks told about each tick.

use tracing::info;

use crate::grid::Grid;
use crate::stats::count_by_species;

/// Notified after each step with the tick number and the authoritative field.
/// Observers only read; the engine never looks at what they do.
pub trait StepObserver {
    fn on_step(&mut self, tick: u64, field: &Grid);
}

impl<F> StepObserver for F
where
    F: FnMut(u64, &Grid),
{
    fn on_step(&mut self, tick: u64, field: &Grid) {
        self(tick, field)
    }
}

/// Logs the per-species counts every `every` ticks.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    every: u64,
}

impl TracingObserver {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl StepObserver for TracingObserver {
    fn on_step(&mut self, tick: u64, field: &Grid) {
        if tick % self.every == 0 {
            let counts = count_by_species(field);
            info!(tick, population = counts.total(), "{counts}");
        }
    }
}
