use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{MovementConfig, PopulationDefaults};
use crate::grid::{Grid, TilePos};
use crate::kernel::InfluenceKernel;
use crate::systems::culture::{CultureId, CultureState};

/// Stable identity of a population. Tiles refer to occupants by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PopulationId(u64);

impl PopulationId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Weak,
    Desperate,
    Dead,
}

/// Behavioural tendencies. Carried and inherited but not yet read by any
/// system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub aggression: f64,
    pub trusting: f64,
    pub innovation: f64,
    pub honor: f64,
    /// Only meaningful once populations become sedentary.
    pub commerce: f64,
    pub piety: f64,
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            aggression: 0.50,
            trusting: 0.15,
            innovation: 0.50,
            honor: 0.50,
            commerce: 0.50,
            piety: 0.50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Population {
    pub id: PopulationId,
    pub pos: TilePos,
    influence_radius: u32,
    kernel: Arc<InfluenceKernel>,
    pub health: f64,
    pub max_health: f64,
    pub growth_health_threshold: f64,
    pub full_health_timer: u32,
    pub population_budding_timer: u32,
    pub conflict_search_radius: u32,
    pub conflict_health_discrepancy_threshold: f64,
    pub culture: CultureState,
    pub traits: Traits,
    pub parent: Option<PopulationId>,
    pub born_turn: u64,
}

impl Population {
    /// A population with no parent; its culture is its own identity alone.
    pub fn founder(
        id: PopulationId,
        pos: TilePos,
        defaults: &PopulationDefaults,
        kernel: Arc<InfluenceKernel>,
        turn: u64,
    ) -> Self {
        Self {
            id,
            pos,
            influence_radius: kernel.radius(),
            kernel,
            health: defaults.initial_health,
            max_health: defaults.max_health,
            growth_health_threshold: defaults.growth_health_threshold,
            full_health_timer: 0,
            population_budding_timer: defaults.budding_timer,
            conflict_search_radius: defaults.conflict_search_radius,
            conflict_health_discrepancy_threshold: defaults.conflict_health_discrepancy_threshold,
            culture: CultureState::founded(CultureId::from(id)),
            traits: Traits::default(),
            parent: None,
            born_turn: turn,
        }
    }

    /// A child budded from `parent`: default attributes, inherited culture
    /// and traits.
    pub fn budded(
        id: PopulationId,
        pos: TilePos,
        parent: &Population,
        defaults: &PopulationDefaults,
        kernel: Arc<InfluenceKernel>,
        turn: u64,
    ) -> Self {
        Self {
            culture: parent.culture.clone(),
            traits: parent.traits.clone(),
            parent: Some(parent.id),
            ..Self::founder(id, pos, defaults, kernel, turn)
        }
    }

    pub fn influence_radius(&self) -> u32 {
        self.influence_radius
    }

    pub fn kernel(&self) -> &Arc<InfluenceKernel> {
        &self.kernel
    }

    /// Swaps in a kernel for a new radius. Only `World::resize_influence`
    /// calls this, between a vacate and a re-place.
    pub(crate) fn set_kernel(&mut self, kernel: Arc<InfluenceKernel>) {
        self.influence_radius = kernel.radius();
        self.kernel = kernel;
    }

    pub fn culture_id(&self) -> CultureId {
        CultureId::from(self.id)
    }

    pub fn health_state(&self, movement: &MovementConfig) -> HealthState {
        if self.health <= 0.0 {
            HealthState::Dead
        } else if self.health <= movement.desperate_cutoff * self.max_health {
            HealthState::Desperate
        } else if self.health <= movement.weak_cutoff * self.max_health {
            HealthState::Weak
        } else {
            HealthState::Healthy
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Owns every live population, keyed by id in creation order.
#[derive(Debug, Default)]
pub struct PopulationRegistry {
    next_id: u64,
    populations: BTreeMap<PopulationId, Population>,
}

impl PopulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id and stores the population `build` makes for it.
    pub fn spawn(&mut self, build: impl FnOnce(PopulationId) -> Population) -> PopulationId {
        let id = PopulationId(self.next_id);
        self.next_id += 1;
        let population = build(id);
        debug_assert_eq!(population.id, id);
        self.populations.insert(id, population);
        id
    }

    pub fn remove(&mut self, id: PopulationId) -> Option<Population> {
        self.populations.remove(&id)
    }

    pub fn get(&self, id: PopulationId) -> Option<&Population> {
        self.populations.get(&id)
    }

    pub fn get_mut(&mut self, id: PopulationId) -> Option<&mut Population> {
        self.populations.get_mut(&id)
    }

    pub fn contains(&self, id: PopulationId) -> bool {
        self.populations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.populations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    /// Ids in ascending order; the per-tick iteration snapshot.
    pub fn ids(&self) -> Vec<PopulationId> {
        self.populations.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Population> {
        self.populations.values()
    }

    /// Other populations within Chebyshev `radius` of `pos`, with their
    /// distance, found through the grid's occupancy index.
    pub fn neighbors_within(
        &self,
        grid: &Grid,
        pos: TilePos,
        radius: u32,
    ) -> Vec<(&Population, u32)> {
        grid.occupied_within(pos, radius)
            .into_iter()
            .filter_map(|(at, id)| self.get(id).map(|p| (p, pos.chebyshev(at))))
            .collect()
    }
}
