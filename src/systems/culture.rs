//! Cultural diffusion: each population's belief weights decay, take up
//! neighbouring cultures weighted by proximity, then get pruned and
//! renormalised.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::CultureConfig;
use crate::population::PopulationId;
use crate::world::World;

/// Culture identifier. A founding population's culture is named after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CultureId(u64);

impl CultureId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<PopulationId> for CultureId {
    fn from(id: PopulationId) -> Self {
        CultureId(id.raw())
    }
}

/// Culture id -> non-negative weight, summing to 1 after every diffusion
/// step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CultureState {
    weights: BTreeMap<CultureId, f64>,
}

impl CultureState {
    pub fn founded(id: CultureId) -> Self {
        Self {
            weights: BTreeMap::from([(id, 1.0)]),
        }
    }

    pub fn from_weights(weights: impl IntoIterator<Item = (CultureId, f64)>) -> Self {
        Self {
            weights: weights.into_iter().collect(),
        }
    }

    pub fn get(&self, id: CultureId) -> f64 {
        self.weights.get(&id).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CultureId, f64)> + '_ {
        self.weights.iter().map(|(id, w)| (*id, *w))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// The heaviest culture. Ties go to the lowest id.
    pub fn predominant(&self) -> Option<CultureId> {
        let mut best: Option<(CultureId, f64)> = None;
        for (id, weight) in self.iter() {
            match best {
                Some((_, top)) if weight <= top => {}
                _ => best = Some((id, weight)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Subtracts `rate / len` from every entry. Entries that would go
    /// negative are dropped; the returned underflow is the decay they could
    /// not pay.
    fn decay(&mut self, rate: f64) -> f64 {
        let share = rate / self.weights.len() as f64;
        let mut underflow = 0.0;
        self.weights.retain(|_, weight| {
            if *weight - share < 0.0 {
                underflow += share - *weight;
                false
            } else {
                *weight -= share;
                true
            }
        });
        underflow
    }

    fn absorb(&mut self, uptake: &BTreeMap<CultureId, f64>, multiplier: f64) {
        for (id, amount) in uptake {
            *self.weights.entry(*id).or_insert(0.0) += amount / multiplier;
        }
    }

    /// Drops entries below `epsilon` and rescales the rest to sum to 1. If
    /// everything would be dropped the predominant culture is kept alone.
    fn prune(&mut self, epsilon: f64) {
        let fallback = self.predominant();
        self.weights.retain(|_, weight| *weight >= epsilon);
        if self.weights.is_empty() {
            if let Some(id) = fallback {
                self.weights.insert(id, 1.0);
            }
            return;
        }
        let kept = self.total();
        for weight in self.weights.values_mut() {
            *weight /= kept;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffusionOutcome {
    Updated,
    /// Decay mass fully underflowed; the distribution was left untouched.
    Degenerate,
}

pub struct CultureDiffusion {
    config: CultureConfig,
}

impl CultureDiffusion {
    pub fn new(config: CultureConfig) -> Self {
        Self { config }
    }

    /// Proximity weight of a neighbour at Chebyshev `distance`.
    pub fn neighbor_weight(&self, distance: u32) -> f64 {
        let radius = self.config.diffusion_radius as f64;
        let distance = distance.max(1) as f64;
        (self.config.foreign_sway * (radius - distance + 1.0) / radius).max(0.0)
    }

    /// Runs one decay / gather / merge / prune step for `id`.
    pub fn diffuse(&self, world: &mut World, id: PopulationId) -> Option<DiffusionOutcome> {
        let population = world.population(id)?;
        let own = population.culture_id();

        let mut uptake = BTreeMap::from([(own, self.config.home_sway)]);
        let mut total_neighboring = 0.0;
        for (neighbor, distance) in world.populations().neighbors_within(
            world.grid(),
            population.pos,
            self.config.diffusion_radius,
        ) {
            let weight = self.neighbor_weight(distance);
            for (culture, share) in neighbor.culture.iter() {
                let contribution = weight * share;
                *uptake.entry(culture).or_insert(0.0) += contribution;
                total_neighboring += contribution;
            }
        }

        let mut next = population.culture.clone();
        if next.is_empty() {
            return Some(DiffusionOutcome::Degenerate);
        }
        let underflow = next.decay(self.config.decay_rate);
        let available = self.config.decay_rate - underflow;
        if available <= 0.0 {
            tracing::trace!(
                target: "worldsim::culture",
                population = %id,
                underflow,
                "culture decay underflowed, skipping merge"
            );
            return Some(DiffusionOutcome::Degenerate);
        }

        let multiplier = (total_neighboring + self.config.home_sway) / available;
        next.absorb(&uptake, multiplier);
        next.prune(self.config.prune_epsilon);

        world.population_mut(id)?.culture = next;
        Some(DiffusionOutcome::Updated)
    }
}
