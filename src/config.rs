//! Simulation-wide tunables.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_movement_radius() -> u32 {
    2
}

fn default_weak_radius() -> u32 {
    6
}

fn default_weak_samples() -> u32 {
    5
}

fn default_desperate_radius() -> u32 {
    9
}

fn default_desperate_samples() -> u32 {
    15
}

fn default_weak_cutoff() -> f64 {
    0.66
}

fn default_desperate_cutoff() -> f64 {
    0.33
}

fn default_home_sway() -> f64 {
    1.0
}

fn default_foreign_sway() -> f64 {
    0.5
}

fn default_decay_rate() -> f64 {
    0.05
}

fn default_diffusion_radius() -> u32 {
    7
}

fn default_prune_epsilon() -> f64 {
    0.005
}

fn default_combat_variance() -> f64 {
    2.0
}

fn default_avg_total_damage() -> f64 {
    5.0
}

fn default_attrition_shape() -> f64 {
    1.0
}

fn default_attrition_scale() -> f64 {
    0.5
}

fn default_attrition_pool_size() -> usize {
    10_000
}

fn default_initial_health() -> f64 {
    12.0
}

fn default_max_health() -> f64 {
    20.0
}

fn default_growth_threshold() -> f64 {
    15.0
}

fn default_budding_timer() -> u32 {
    12
}

fn default_influence_radius() -> u32 {
    4
}

fn default_conflict_search_radius() -> u32 {
    3
}

fn default_discrepancy_threshold() -> f64 {
    2.0
}

fn default_max_populations() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    #[serde(default = "default_movement_radius")]
    pub default_radius: u32,
    #[serde(default = "default_weak_radius")]
    pub weak_radius: u32,
    #[serde(default = "default_weak_samples")]
    pub weak_samples: u32,
    #[serde(default = "default_desperate_radius")]
    pub desperate_radius: u32,
    #[serde(default = "default_desperate_samples")]
    pub desperate_samples: u32,
    /// Fraction of `max_health` at or below which a population is weak.
    #[serde(default = "default_weak_cutoff")]
    pub weak_cutoff: f64,
    /// Fraction of `max_health` at or below which a population is desperate.
    #[serde(default = "default_desperate_cutoff")]
    pub desperate_cutoff: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            default_radius: default_movement_radius(),
            weak_radius: default_weak_radius(),
            weak_samples: default_weak_samples(),
            desperate_radius: default_desperate_radius(),
            desperate_samples: default_desperate_samples(),
            weak_cutoff: default_weak_cutoff(),
            desperate_cutoff: default_desperate_cutoff(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureConfig {
    #[serde(default = "default_home_sway")]
    pub home_sway: f64,
    #[serde(default = "default_foreign_sway")]
    pub foreign_sway: f64,
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "default_diffusion_radius")]
    pub diffusion_radius: u32,
    #[serde(default = "default_prune_epsilon")]
    pub prune_epsilon: f64,
}

impl Default for CultureConfig {
    fn default() -> Self {
        Self {
            home_sway: default_home_sway(),
            foreign_sway: default_foreign_sway(),
            decay_rate: default_decay_rate(),
            diffusion_radius: default_diffusion_radius(),
            prune_epsilon: default_prune_epsilon(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default = "default_combat_variance")]
    pub variance: f64,
    #[serde(default = "default_avg_total_damage")]
    pub avg_total_damage: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            variance: default_combat_variance(),
            avg_total_damage: default_avg_total_damage(),
        }
    }
}

/// Gamma-distributed attrition. A pool size of zero disables attrition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionConfig {
    #[serde(default = "default_attrition_shape")]
    pub shape: f64,
    #[serde(default = "default_attrition_scale")]
    pub scale: f64,
    #[serde(default = "default_attrition_pool_size")]
    pub pool_size: usize,
}

impl Default for AttritionConfig {
    fn default() -> Self {
        Self {
            shape: default_attrition_shape(),
            scale: default_attrition_scale(),
            pool_size: default_attrition_pool_size(),
        }
    }
}

/// Attributes a new population starts with, whether founded or budded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationDefaults {
    #[serde(default = "default_initial_health")]
    pub initial_health: f64,
    #[serde(default = "default_max_health")]
    pub max_health: f64,
    #[serde(default = "default_growth_threshold")]
    pub growth_health_threshold: f64,
    #[serde(default = "default_budding_timer")]
    pub budding_timer: u32,
    #[serde(default = "default_influence_radius")]
    pub influence_radius: u32,
    #[serde(default = "default_conflict_search_radius")]
    pub conflict_search_radius: u32,
    #[serde(default = "default_discrepancy_threshold")]
    pub conflict_health_discrepancy_threshold: f64,
}

impl Default for PopulationDefaults {
    fn default() -> Self {
        Self {
            initial_health: default_initial_health(),
            max_health: default_max_health(),
            growth_health_threshold: default_growth_threshold(),
            budding_timer: default_budding_timer(),
            influence_radius: default_influence_radius(),
            conflict_search_radius: default_conflict_search_radius(),
            conflict_health_discrepancy_threshold: default_discrepancy_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConstants {
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub culture: CultureConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub attrition: AttritionConfig,
    #[serde(default)]
    pub population: PopulationDefaults,
    #[serde(default = "default_max_populations")]
    pub max_populations: usize,
    /// Place a fresh founder whenever every population has died.
    #[serde(default = "default_true")]
    pub reseed_on_extinction: bool,
}

impl Default for SimulationConstants {
    fn default() -> Self {
        Self {
            movement: MovementConfig::default(),
            culture: CultureConfig::default(),
            combat: CombatConfig::default(),
            attrition: AttritionConfig::default(),
            population: PopulationDefaults::default(),
            max_populations: default_max_populations(),
            reseed_on_extinction: true,
        }
    }
}

/// Largest radius any search window or influence kernel may use.
pub const MAX_RADIUS: u32 = 1024;

impl SimulationConstants {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radii = [
            ("movement.default_radius", self.movement.default_radius),
            ("movement.weak_radius", self.movement.weak_radius),
            ("movement.desperate_radius", self.movement.desperate_radius),
            ("culture.diffusion_radius", self.culture.diffusion_radius),
            ("population.influence_radius", self.population.influence_radius),
            ("population.conflict_search_radius", self.population.conflict_search_radius),
        ];
        for (name, radius) in radii {
            if radius > MAX_RADIUS {
                return Err(ConfigError::constant(
                    name,
                    format!("radius {radius} exceeds the maximum of {MAX_RADIUS}"),
                ));
            }
        }

        let movement = &self.movement;
        if !(0.0 < movement.desperate_cutoff && movement.desperate_cutoff < movement.weak_cutoff)
            || movement.weak_cutoff >= 1.0
        {
            return Err(ConfigError::constant(
                "movement.weak_cutoff",
                format!(
                    "cutoffs must satisfy 0 < desperate ({}) < weak ({}) < 1",
                    movement.desperate_cutoff, movement.weak_cutoff
                ),
            ));
        }

        let culture = &self.culture;
        if !(culture.decay_rate > 0.0 && culture.decay_rate < 1.0) {
            return Err(ConfigError::constant(
                "culture.decay_rate",
                format!("must lie in (0, 1), got {}", culture.decay_rate),
            ));
        }
        if culture.diffusion_radius == 0 {
            return Err(ConfigError::constant("culture.diffusion_radius", "must be positive"));
        }
        if culture.home_sway <= 0.0 || culture.foreign_sway < 0.0 {
            return Err(ConfigError::constant(
                "culture.home_sway",
                "home sway must be positive and foreign sway non-negative",
            ));
        }
        if !(0.0..1.0).contains(&culture.prune_epsilon) {
            return Err(ConfigError::constant("culture.prune_epsilon", "must lie in [0, 1)"));
        }

        if self.combat.variance < 0.0 {
            return Err(ConfigError::constant("combat.variance", "must be non-negative"));
        }

        let attrition = &self.attrition;
        if attrition.pool_size > 0 && (attrition.shape <= 0.0 || attrition.scale <= 0.0) {
            return Err(ConfigError::constant(
                "attrition.shape",
                format!(
                    "gamma shape ({}) and scale ({}) must be positive",
                    attrition.shape, attrition.scale
                ),
            ));
        }

        let population = &self.population;
        if population.max_health <= 0.0 {
            return Err(ConfigError::constant("population.max_health", "must be positive"));
        }
        if population.initial_health <= 0.0 || population.initial_health > population.max_health {
            return Err(ConfigError::constant(
                "population.initial_health",
                format!("must lie in (0, {}]", population.max_health),
            ));
        }
        if population.budding_timer == 0 {
            return Err(ConfigError::constant("population.budding_timer", "must be positive"));
        }
        Ok(())
    }
}
