pub mod budding;
pub mod census;
pub mod conflict;
pub mod culture;
pub mod health;
mod invariants;
pub mod movement;

pub use budding::{Budding, BuddingOutcome};
pub use census::{CultureCensus, CultureCensusSystem};
pub use conflict::{CombatResult, ConflictResolver};
pub use culture::{CultureDiffusion, CultureId, CultureState, DiffusionOutcome};
pub use health::{AttritionPool, HealthEngine, HealthOutcome};
pub use invariants::InvariantCheckSystem;
pub use movement::MovementPolicy;
