//! Per-species live counts and the viability predicate.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::grid::Grid;
use crate::species::Species;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SpeciesCounts {
    counts: BTreeMap<Species, usize>,
}

impl SpeciesCounts {
    pub fn get(&self, species: Species) -> usize {
        self.counts.get(&species).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn nonzero_species(&self) -> usize {
        self.counts.values().filter(|&&count| count > 0).count()
    }

    /// More than one species still present.
    pub fn is_viable(&self) -> bool {
        self.nonzero_species() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (Species, usize)> + '_ {
        self.counts.iter().map(|(&species, &count)| (species, count))
    }

    fn record(&mut self, species: Species) {
        *self.counts.entry(species).or_insert(0) += 1;
    }
}

impl fmt::Display for SpeciesCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (species, count) in self.iter().filter(|&(_, count)| count > 0) {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{species}: {count}")?;
            first = false;
        }
        Ok(())
    }
}

/// One scan of the occupancy plane.
pub fn count_by_species(grid: &Grid) -> SpeciesCounts {
    let mut counts = SpeciesCounts::default();
    for (_, occupant) in grid.occupants() {
        counts.record(occupant.species);
    }
    counts
}

/// Lazily computed counts, cached until the next population change.
#[derive(Debug, Default)]
pub struct PopulationStats {
    cached: OnceCell<SpeciesCounts>,
}

impl PopulationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self, grid: &Grid) -> &SpeciesCounts {
        self.cached.get_or_init(|| count_by_species(grid))
    }

    pub fn is_viable(&self, grid: &Grid) -> bool {
        self.counts(grid).is_viable()
    }

    pub fn invalidate(&mut self) {
        self.cached.take();
    }

    pub fn is_stale(&self) -> bool {
        self.cached.get().is_none()
    }
}
