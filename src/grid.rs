//! Occupancy and terrain planes for one buffer of the field.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::agent::AgentId;
use crate::location::Location;
use crate::species::Species;
use crate::terrain::{self, Terrain};

/// Moore neighborhood offsets in canonical scan order (row-major).
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// What a cell knows about the agent standing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub id: AgentId,
    pub species: Species,
}

#[derive(Debug, Clone)]
pub struct Grid {
    depth: usize,
    width: usize,
    occupancy: Vec<Option<Occupant>>,
    terrain: Vec<Option<Terrain>>,
}

impl Grid {
    pub fn new(depth: usize, width: usize) -> Self {
        assert!(depth > 0 && width > 0, "grid dimensions must be positive");
        let cells = depth * width;
        Self {
            depth,
            width,
            occupancy: vec![None; cells],
            terrain: vec![None; cells],
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, loc: Location) -> bool {
        loc.row < self.depth && loc.col < self.width
    }

    #[inline]
    fn index(&self, loc: Location) -> usize {
        debug_assert!(self.contains(loc), "{loc} is outside the field");
        loc.row * self.width + loc.col
    }

    /// Put an occupant on a free cell whose terrain accepts it.
    pub fn place(&mut self, occupant: Occupant, loc: Location) {
        let idx = self.index(loc);
        debug_assert!(
            self.occupancy[idx].is_none(),
            "{loc} is already occupied by {:?}",
            self.occupancy[idx]
        );
        debug_assert!(
            terrain::admits(self.terrain[idx], occupant.species),
            "{} may not stand on {:?} at {loc}",
            occupant.species,
            self.terrain[idx]
        );
        self.occupancy[idx] = Some(occupant);
    }

    pub fn get(&self, loc: Location) -> Option<Occupant> {
        self.occupancy[self.index(loc)]
    }

    pub fn is_free(&self, loc: Location) -> bool {
        self.get(loc).is_none()
    }

    /// Free and the terrain admits `species`.
    pub fn open_for(&self, loc: Location, species: Species) -> bool {
        self.is_free(loc) && self.accepts(loc, species)
    }

    pub fn accepts(&self, loc: Location, species: Species) -> bool {
        terrain::admits(self.terrain_at(loc), species)
    }

    pub fn vacate(&mut self, loc: Location) -> Option<Occupant> {
        let idx = self.index(loc);
        self.occupancy[idx].take()
    }

    /// Empty every cell; terrain is untouched.
    pub fn clear_occupancy(&mut self) {
        self.occupancy.fill(None);
    }

    pub fn retain_occupants(&mut self, mut keep: impl FnMut(&Occupant) -> bool) {
        for cell in &mut self.occupancy {
            if cell.as_ref().is_some_and(|occupant| !keep(occupant)) {
                *cell = None;
            }
        }
    }

    pub fn terrain_at(&self, loc: Location) -> Option<Terrain> {
        self.terrain[self.index(loc)]
    }

    pub fn set_terrain_at(&mut self, loc: Location, terrain: Terrain) {
        let idx = self.index(loc);
        self.terrain[idx] = Some(terrain);
    }

    /// Mirror another buffer's terrain plane.
    pub fn copy_terrain_from(&mut self, other: &Grid) {
        assert!(
            self.depth == other.depth && self.width == other.width,
            "terrain planes differ in size"
        );
        self.terrain.copy_from_slice(&other.terrain);
    }

    pub fn neighbor_iter(&self, loc: Location) -> impl Iterator<Item = Location> + '_ {
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let row = loc.row.checked_add_signed(dr)?;
            let col = loc.col.checked_add_signed(dc)?;
            (row < self.depth && col < self.width).then_some(Location::new(row, col))
        })
    }

    /// In-bounds Moore neighbors of `loc`, center excluded, in canonical order.
    pub fn neighbors(&self, loc: Location) -> Vec<Location> {
        self.neighbor_iter(loc).collect()
    }

    pub fn first_free_neighbor(&self, loc: Location) -> Option<Location> {
        self.neighbor_iter(loc).find(|&cell| self.is_free(cell))
    }

    /// First neighbor that is free and whose terrain admits `species`.
    pub fn first_open_neighbor(&self, loc: Location, species: Species) -> Option<Location> {
        self.neighbor_iter(loc)
            .find(|&cell| self.open_for(cell, species))
    }

    pub fn random_free_neighbor<R: Rng + ?Sized>(
        &self,
        loc: Location,
        rng: &mut R,
    ) -> Option<Location> {
        let free: Vec<Location> = self
            .neighbor_iter(loc)
            .filter(|&cell| self.is_free(cell))
            .collect();
        free.choose(rng).copied()
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.depth).flat_map(move |row| (0..self.width).map(move |col| Location::new(row, col)))
    }

    /// Occupied cells in row-major order.
    pub fn occupants(&self) -> impl Iterator<Item = (Location, Occupant)> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter_map(move |(idx, cell)| {
                cell.map(|occupant| (Location::new(idx / self.width, idx % self.width), occupant))
            })
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|cell| cell.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::agent::{Agent, Population};
    use crate::rng::SimRng;

    fn plains(depth: usize, width: usize) -> Grid {
        let mut grid = Grid::new(depth, width);
        let cells: Vec<Location> = grid.locations().collect();
        for loc in cells {
            grid.set_terrain_at(loc, Terrain::Plains);
        }
        grid
    }

    fn occupant(population: &mut Population, species: Species) -> Occupant {
        let id = population.allocate_id();
        let agent = Agent::new(id, species, Location::new(0, 0), 0, None);
        agent.occupant()
    }

    #[test]
    fn test_neighbor_counts() {
        let grid = plains(4, 5);
        for loc in grid.locations() {
            let neighbors = grid.neighbors(loc);
            let on_row_edge = loc.row == 0 || loc.row == 3;
            let on_col_edge = loc.col == 0 || loc.col == 4;
            let expected = match (on_row_edge, on_col_edge) {
                (true, true) => 3,
                (true, false) | (false, true) => 5,
                (false, false) => 8,
            };
            assert_eq!(neighbors.len(), expected, "neighbors of {loc}");

            let distinct: HashSet<Location> = neighbors.iter().copied().collect();
            assert_eq!(distinct.len(), neighbors.len());
            assert!(!distinct.contains(&loc));
            assert!(neighbors.iter().all(|&n| grid.contains(n) && n.distance(loc) == 1));
        }
    }

    #[test]
    fn test_neighbor_canonical_order() {
        let grid = plains(3, 3);
        let center = grid.neighbors(Location::new(1, 1));
        assert_eq!(
            center,
            vec![
                Location::new(0, 0),
                Location::new(0, 1),
                Location::new(0, 2),
                Location::new(1, 0),
                Location::new(1, 2),
                Location::new(2, 0),
                Location::new(2, 1),
                Location::new(2, 2),
            ]
        );
        assert_eq!(
            grid.neighbors(Location::new(0, 0)),
            vec![Location::new(0, 1), Location::new(1, 0), Location::new(1, 1)]
        );
    }

    #[test]
    fn test_clear_occupancy_keeps_terrain() {
        let mut population = Population::new();
        let mut grid = plains(3, 3);
        grid.set_terrain_at(Location::new(2, 2), Terrain::Refuge);
        grid.place(occupant(&mut population, Species::Rabbit), Location::new(2, 2));
        grid.place(occupant(&mut population, Species::Fox), Location::new(0, 0));
        let before: Vec<Option<Terrain>> = grid.locations().map(|l| grid.terrain_at(l)).collect();

        grid.clear_occupancy();

        let after: Vec<Option<Terrain>> = grid.locations().map(|l| grid.terrain_at(l)).collect();
        assert_eq!(before, after);
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.locations().all(|l| grid.is_free(l)));
    }

    #[test]
    fn test_first_free_neighbor_skips_occupied() {
        let mut population = Population::new();
        let mut grid = plains(3, 3);
        grid.place(occupant(&mut population, Species::Rabbit), Location::new(0, 0));
        grid.place(occupant(&mut population, Species::Rabbit), Location::new(0, 1));

        assert_eq!(
            grid.first_free_neighbor(Location::new(1, 1)),
            Some(Location::new(0, 2))
        );
    }

    #[test]
    fn test_first_open_neighbor_respects_terrain() {
        let mut grid = plains(3, 3);
        grid.set_terrain_at(Location::new(0, 0), Terrain::Savanna);
        grid.set_terrain_at(Location::new(0, 1), Terrain::Refuge);

        assert_eq!(
            grid.first_open_neighbor(Location::new(1, 1), Species::Fox),
            Some(Location::new(0, 2))
        );
        assert_eq!(
            grid.first_open_neighbor(Location::new(1, 1), Species::Lion),
            Some(Location::new(0, 0))
        );
        assert_eq!(
            grid.first_open_neighbor(Location::new(1, 1), Species::Rabbit),
            Some(Location::new(0, 1))
        );
    }

    #[test]
    fn test_random_free_neighbor_only_free_cells() {
        let mut population = Population::new();
        let mut grid = plains(3, 3);
        let center = Location::new(1, 1);
        let neighbors = grid.neighbors(center);
        for &cell in &neighbors[..7] {
            grid.place(occupant(&mut population, Species::Rabbit), cell);
        }
        let mut rng = SimRng::new(5);
        for _ in 0..20 {
            assert_eq!(grid.random_free_neighbor(center, &mut rng), Some(neighbors[7]));
        }

        grid.place(occupant(&mut population, Species::Rabbit), neighbors[7]);
        assert_eq!(grid.random_free_neighbor(center, &mut rng), None);
        assert_eq!(grid.first_free_neighbor(center), None);
    }

    #[test]
    fn test_occupants_reports_coordinates() {
        let mut population = Population::new();
        let mut grid = plains(2, 3);
        let fox = occupant(&mut population, Species::Fox);
        grid.place(fox, Location::new(1, 2));

        let found: Vec<(Location, Occupant)> = grid.occupants().collect();
        assert_eq!(found, vec![(Location::new(1, 2), fox)]);
        assert_eq!(grid.vacate(Location::new(1, 2)), Some(fox));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_copy_terrain_from() {
        let mut source = plains(2, 2);
        source.set_terrain_at(Location::new(1, 1), Terrain::Mountain);
        let mut target = Grid::new(2, 2);
        target.copy_terrain_from(&source);

        for loc in source.locations() {
            assert_eq!(source.terrain_at(loc), target.terrain_at(loc));
        }
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn test_place_on_occupied_cell_panics() {
        let mut population = Population::new();
        let mut grid = plains(2, 2);
        grid.place(occupant(&mut population, Species::Rabbit), Location::new(0, 0));
        grid.place(occupant(&mut population, Species::Fox), Location::new(0, 0));
    }

    #[test]
    #[should_panic(expected = "may not stand on")]
    fn test_place_on_forbidden_terrain_panics() {
        let mut population = Population::new();
        let mut grid = plains(2, 2);
        grid.set_terrain_at(Location::new(0, 0), Terrain::Refuge);
        grid.place(occupant(&mut population, Species::Lion), Location::new(0, 0));
    }
}
