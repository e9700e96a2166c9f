use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::config::AttritionConfig;
use crate::error::ConfigError;
use crate::population::{Population, PopulationId};
use crate::world::World;

/// Pre-drawn gamma samples. Each tick a population loses `floor(sample)`
/// health to a randomly picked entry.
#[derive(Debug, Clone, Default)]
pub struct AttritionPool {
    samples: Vec<f64>,
}

impl AttritionPool {
    pub fn generate<R: Rng + ?Sized>(config: &AttritionConfig, rng: &mut R) -> Result<Self, ConfigError> {
        if config.pool_size == 0 {
            return Ok(Self::disabled());
        }
        let gamma = Gamma::new(config.shape, config.scale).map_err(|err| {
            ConfigError::constant("attrition.shape", format!("invalid gamma parameters: {err}"))
        })?;
        let samples = (0..config.pool_size).map(|_| gamma.sample(rng)).collect();
        Ok(Self { samples })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples[rng.gen_range(0..self.samples.len())].floor()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthOutcome {
    Alive,
    Dead,
}

pub struct HealthEngine {
    attrition: AttritionPool,
}

impl HealthEngine {
    pub fn new(attrition: AttritionPool) -> Self {
        Self { attrition }
    }

    /// Resource pressure on the population's tile: +1 when at or under
    /// capacity (capped at `max_health`), minus the overflow otherwise.
    pub fn apply_crowding(population: &mut Population, carrying_capacity: i32, crowdedness: f64) {
        let delta = carrying_capacity as f64 - crowdedness;
        if delta >= 0.0 {
            population.health = (population.health + 1.0).min(population.max_health);
        } else {
            population.health -= delta.abs();
        }
    }

    pub fn update_growth_timer(population: &mut Population) {
        if population.health >= population.growth_health_threshold {
            population.full_health_timer += 1;
        } else {
            population.full_health_timer = 0;
        }
    }

    /// Crowding, attrition and growth-timer bookkeeping for one population on
    /// its current tile.
    pub fn update<R: Rng + ?Sized>(&self, world: &mut World, id: PopulationId, rng: &mut R) -> Option<HealthOutcome> {
        let pos = world.population(id)?.pos;
        let tile = world.grid().tile(pos);
        let (capacity, crowdedness) = (tile.carrying_capacity, tile.crowdedness);
        let attrition = self.attrition.draw(rng);

        let population = world.population_mut(id)?;
        Self::apply_crowding(population, capacity, crowdedness);
        population.health -= attrition;
        Self::update_growth_timer(population);

        if population.is_dead() {
            Some(HealthOutcome::Dead)
        } else {
            Some(HealthOutcome::Alive)
        }
    }
}
