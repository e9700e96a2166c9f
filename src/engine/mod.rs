mod control;

use std::any::Any;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use control::RunControl;

use crate::{
    config::SimulationConstants,
    population::PopulationId,
    rng::{RngManager, SystemRng},
    systems::{
        AttritionPool, Budding, BuddingOutcome, ConflictResolver, CultureDiffusion,
        DiffusionOutcome, HealthEngine, HealthOutcome, MovementPolicy,
    },
    world::World,
};

const PLACEMENT: &str = "placement";
const ATTRITION: &str = "attrition";
const MOVEMENT: &str = "movement";
const HEALTH: &str = "health";
const COMBAT: &str = "combat";
const BUDDING: &str = "budding";

/// Core streams, created up front so their seeds do not depend on which
/// component happens to draw first.
const CORE_STREAMS: [&str; 6] = [PLACEMENT, ATTRITION, MOVEMENT, HEALTH, COMBAT, BUDDING];

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self, constants: &SimulationConstants) -> Result<Engine> {
        let mut rng = RngManager::new(self.settings.seed);
        for name in CORE_STREAMS {
            rng.stream(name);
        }
        let attrition = AttritionPool::generate(&constants.attrition, &mut rng.stream(ATTRITION))
            .context("failed to generate attrition pool")?;

        Ok(Engine {
            rng,
            movement: MovementPolicy::new(constants.movement.clone()),
            health: HealthEngine::new(attrition),
            conflict: ConflictResolver::new(constants.combat.clone()),
            culture: CultureDiffusion::new(constants.culture.clone()),
            budding: Budding::new(),
            systems: self.systems,
            settings: self.settings,
        })
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: u64,
    pub populations: usize,
    pub births: u64,
    pub deaths: u64,
    pub combats: u64,
    pub moves: u64,
    pub suppressed_buds: u64,
    pub degenerate_cultures: u64,
    pub total_deaths: u64,
    pub reseeded: bool,
}

/// Drives ticks over a `World`. Each population is advanced in turn:
/// culture, vacate, move, re-place, health, conflict, budding.
pub struct Engine {
    rng: RngManager,
    movement: MovementPolicy,
    health: HealthEngine,
    conflict: ConflictResolver,
    culture: CultureDiffusion,
    budding: Budding,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_, _| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TurnReport, &World),
    {
        for _ in 0..ticks {
            let report = self.step(world)?;
            hook(&report, world);
        }
        Ok(())
    }

    /// Runs until `control` is paused or its stop-after turn is reached.
    /// Returns the number of ticks executed. Calling again after
    /// `control.resume()` continues from the next whole tick.
    pub fn run_until_paused<F>(
        &mut self,
        world: &mut World,
        control: &RunControl,
        mut hook: F,
    ) -> Result<u64>
    where
        F: FnMut(&TurnReport, &World),
    {
        let mut ran = 0;
        while !control.is_paused() {
            if control.stop_reached(world.turn()) {
                control.pause();
                break;
            }
            let report = self.step(world)?;
            hook(&report, world);
            ran += 1;
        }
        info!(
            target: "worldsim::engine",
            scenario = %self.settings.scenario_name,
            "{} populations in {} turns",
            world.population_count(),
            world.turn()
        );
        Ok(ran)
    }

    /// Advances the world by one tick.
    pub fn step(&mut self, world: &mut World) -> Result<TurnReport> {
        let mut report = TurnReport {
            turn: world.turn() + 1,
            ..TurnReport::default()
        };

        let order = world.populations().ids();
        if order.is_empty() && world.constants().reseed_on_extinction {
            let founder = world
                .found_on_random_land(&mut self.rng.stream(PLACEMENT))
                .context("no free land to reseed an extinct world")?;
            info!(target: "worldsim::engine", turn = report.turn, %founder, "world reseeded");
            report.reseeded = true;
        }

        for id in order {
            // may have died in an earlier population's combat this tick
            if world.populations().contains(id) {
                self.advance_population(world, id, &mut report);
            }
        }

        world.advance_turn();
        let ctx = SystemContext {
            turn: world.turn(),
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng = self.rng.stream(system.name());
            system
                .run(&ctx, world, &mut rng)
                .with_context(|| format!("system '{}' failed on turn {}", system.name(), ctx.turn))?;
        }

        report.populations = world.population_count();
        report.total_deaths = world.total_deaths();
        debug!(
            target: "worldsim::engine",
            turn = report.turn,
            populations = report.populations,
            births = report.births,
            deaths = report.deaths,
            combats = report.combats,
            "turn complete"
        );
        Ok(report)
    }

    fn advance_population(&mut self, world: &mut World, id: PopulationId, report: &mut TurnReport) {
        if self.culture.diffuse(world, id) == Some(DiffusionOutcome::Degenerate) {
            report.degenerate_cultures += 1;
        }

        let Some(origin) = world.population(id).map(|p| p.pos) else {
            return;
        };
        world.vacate(id);
        let destination = self
            .movement
            .choose_destination(world, id, &mut self.rng.stream(MOVEMENT))
            .unwrap_or(origin);
        world.settle(id, destination);
        if destination != origin {
            report.moves += 1;
        }

        if self.health.update(world, id, &mut self.rng.stream(HEALTH)) == Some(HealthOutcome::Dead) {
            world.kill(id);
            report.deaths += 1;
            return;
        }

        if let Some(target) = self.conflict.find_target(world, id) {
            if self
                .conflict
                .resolve(world, id, target, &mut self.rng.stream(COMBAT))
                .is_some()
            {
                report.combats += 1;
                for combatant in [id, target] {
                    if world.population(combatant).is_some_and(|p| p.is_dead()) {
                        world.kill(combatant);
                        report.deaths += 1;
                    }
                }
            }
        }
        if !world.populations().contains(id) {
            return;
        }

        match self
            .budding
            .try_bud(world, id, &self.movement, &mut self.rng.stream(BUDDING))
        {
            BuddingOutcome::Budded(_) => report.births += 1,
            BuddingOutcome::AtCapacity => report.suppressed_buds += 1,
            BuddingOutcome::NotReady | BuddingOutcome::NoRoom => {}
        }
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn get_system<T: 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|system| system.as_any().downcast_ref::<T>())
    }
}

pub struct SystemContext<'a> {
    pub turn: u64,
    pub scenario_name: &'a str,
}

/// A whole-world pass run once at the end of every tick, after all
/// populations have been advanced.
pub trait System {
    fn name(&self) -> &'static str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
    fn as_any(&self) -> &dyn Any;
}
