pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod population;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod terrain;
pub mod world;

pub use config::SimulationConstants;
pub use engine::{Engine, EngineBuilder, EngineSettings, RunControl, TurnReport};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
