use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConstants;
use crate::error::{ConfigError, InvariantViolation};
use crate::grid::{Grid, TilePos};
use crate::kernel::KernelCache;
use crate::population::{Population, PopulationId, PopulationRegistry};
use crate::terrain::{BiomeTable, TerrainOracle};

const CULTURE_SUM_TOLERANCE: f64 = 1e-6;
const PLACEMENT_ATTEMPTS: usize = 64;

/// What a renderer needs to draw one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationView {
    pub id: u64,
    pub x: u32,
    pub y: u32,
    pub health: f64,
    pub predominant_culture: Option<u64>,
    pub parent: Option<u64>,
    pub born_turn: u64,
}

/// The simulation context: terrain, grid, populations, constants and
/// counters. Every component receives it explicitly.
pub struct World {
    terrain: Box<dyn TerrainOracle>,
    grid: Grid,
    populations: PopulationRegistry,
    kernels: KernelCache,
    constants: SimulationConstants,
    turn: u64,
    total_deaths: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("width", &self.grid.width())
            .field("height", &self.grid.height())
            .field("turn", &self.turn)
            .field("populations", &self.populations.len())
            .field("total_deaths", &self.total_deaths)
            .finish()
    }
}

impl World {
    pub fn new(
        terrain: Box<dyn TerrainOracle>,
        table: &BiomeTable,
        constants: SimulationConstants,
    ) -> Result<Self, ConfigError> {
        constants.validate()?;
        let grid = Grid::from_terrain(terrain.as_ref(), table)?;
        Ok(Self {
            terrain,
            grid,
            populations: PopulationRegistry::new(),
            kernels: KernelCache::new(),
            constants,
            turn: 0,
            total_deaths: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn terrain(&self) -> &dyn TerrainOracle {
        self.terrain.as_ref()
    }

    pub fn populations(&self) -> &PopulationRegistry {
        &self.populations
    }

    pub fn population(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get(id)
    }

    pub fn population_mut(&mut self, id: PopulationId) -> Option<&mut Population> {
        self.populations.get_mut(id)
    }

    pub fn constants(&self) -> &SimulationConstants {
        &self.constants
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }

    pub fn total_deaths(&self) -> u64 {
        self.total_deaths
    }

    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    /// Places a parentless population at `pos`.
    pub fn found(&mut self, pos: TilePos) -> Result<PopulationId, ConfigError> {
        if !self.is_free_land(pos) {
            return Err(ConfigError::InvalidFounder(pos));
        }
        let kernel = self.kernels.get(self.constants.population.influence_radius);
        let defaults = &self.constants.population;
        let turn = self.turn;
        let id = self
            .populations
            .spawn(|id| Population::founder(id, pos, defaults, kernel, turn));
        self.place(id);
        Ok(id)
    }

    /// Founds a population on a random free land tile.
    pub fn found_on_random_land(&mut self, rng: &mut dyn RngCore) -> Result<PopulationId, ConfigError> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let pos = self.terrain.random_land(rng).ok_or(ConfigError::NoLand)?;
            if !self.grid.is_occupied(pos) {
                return self.found(pos);
            }
        }
        Err(ConfigError::NoLand)
    }

    /// Buds a child of `parent` onto `pos`, which must be free land.
    pub fn bud(&mut self, parent: PopulationId, pos: TilePos) -> Option<PopulationId> {
        if !self.is_free_land(pos) {
            return None;
        }
        let parent = self.populations.get(parent)?.clone();
        let kernel = self.kernels.get(self.constants.population.influence_radius);
        let defaults = &self.constants.population;
        let turn = self.turn;
        let id = self
            .populations
            .spawn(|id| Population::budded(id, pos, &parent, defaults, kernel, turn));
        self.place(id);
        Some(id)
    }

    /// Registers `id` on its tile: occupant, index and crowdedness together.
    pub fn place(&mut self, id: PopulationId) {
        let Some(population) = self.populations.get(id) else {
            return;
        };
        let (pos, kernel) = (population.pos, population.kernel().clone());
        self.grid.set_occupant(pos, id);
        self.grid.apply_influence(pos, &kernel, 1.0);
    }

    /// Reverses `place`, using the kernel that was applied at insertion.
    pub fn vacate(&mut self, id: PopulationId) {
        let Some(population) = self.populations.get(id) else {
            return;
        };
        let (pos, kernel) = (population.pos, population.kernel().clone());
        if self.grid.tile(pos).occupant == Some(id) {
            self.grid.clear_occupant(pos);
        }
        self.grid.apply_influence(pos, &kernel, -1.0);
    }

    /// Moves an already vacated population to `to` and places it there.
    pub fn settle(&mut self, id: PopulationId, to: TilePos) {
        if let Some(population) = self.populations.get_mut(id) {
            population.pos = to;
        }
        self.place(id);
    }

    /// Vacates, moves and re-places `id`.
    pub fn relocate(&mut self, id: PopulationId, to: TilePos) {
        self.vacate(id);
        self.settle(id, to);
    }

    /// Removes a population from the grid and the registry.
    pub fn kill(&mut self, id: PopulationId) -> Option<Population> {
        self.vacate(id);
        let removed = self.populations.remove(id);
        if removed.is_some() {
            self.total_deaths += 1;
        }
        removed
    }

    /// Changes a population's influence radius without breaking crowdedness
    /// accounting.
    pub fn resize_influence(&mut self, id: PopulationId, radius: u32) {
        if !self.populations.contains(id) {
            return;
        }
        self.vacate(id);
        let kernel = self.kernels.get(radius);
        if let Some(population) = self.populations.get_mut(id) {
            population.set_kernel(kernel);
        }
        self.place(id);
    }

    pub fn is_free_land(&self, pos: TilePos) -> bool {
        self.grid.contains(pos) && !self.grid.is_ocean(pos) && !self.grid.is_occupied(pos)
    }

    pub fn population_views(&self) -> Vec<PopulationView> {
        self.populations
            .iter()
            .map(|p| PopulationView {
                id: p.id.raw(),
                x: p.pos.x,
                y: p.pos.y,
                health: p.health,
                predominant_culture: p.culture.predominant().map(|c| c.raw()),
                parent: p.parent.map(|id| id.raw()),
                born_turn: p.born_turn,
            })
            .collect()
    }

    /// Verifies occupancy, crowdedness, health and culture invariants.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for tile in self.grid.tiles() {
            let indexed = self.grid.is_occupied(tile.pos);
            let valid = match tile.occupant {
                Some(id) => indexed && self.populations.get(id).map(|p| p.pos) == Some(tile.pos),
                None => !indexed,
            };
            if !valid {
                return Err(InvariantViolation::Occupancy {
                    pos: tile.pos,
                    tile: tile.occupant,
                    indexed,
                });
            }
        }

        let width = self.grid.width() as usize;
        let mut expected = vec![0.0_f64; self.grid.tile_count() as usize];
        for population in self.populations.iter() {
            if self.grid.tile(population.pos).occupant != Some(population.id) {
                return Err(InvariantViolation::Misplaced {
                    id: population.id,
                    pos: population.pos,
                });
            }
            if !(0.0..=population.max_health).contains(&population.health) {
                return Err(InvariantViolation::Health {
                    id: population.id,
                    health: population.health,
                    max: population.max_health,
                });
            }
            let sum = population.culture.total();
            if (sum - 1.0).abs() >= CULTURE_SUM_TOLERANCE {
                return Err(InvariantViolation::CultureSum {
                    id: population.id,
                    sum,
                });
            }
            for (dx, dy, weight) in population.kernel().offsets() {
                if let Some(pos) = self.grid.offset(population.pos, dx, dy) {
                    expected[pos.y as usize * width + pos.x as usize] += weight as f64;
                }
            }
        }
        for tile in self.grid.tiles() {
            let want = expected[tile.pos.y as usize * width + tile.pos.x as usize];
            if tile.crowdedness != want {
                return Err(InvariantViolation::Crowdedness {
                    pos: tile.pos,
                    expected: want,
                    found: tile.crowdedness,
                });
            }
        }
        Ok(())
    }
}
