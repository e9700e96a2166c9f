use std::any::Any;

use anyhow::{Context, Result};

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Fails the run as soon as a world-state invariant breaks.
#[derive(Debug, Default)]
pub struct InvariantCheckSystem;

impl InvariantCheckSystem {
    pub fn new() -> Self {
        Self
    }
}

impl System for InvariantCheckSystem {
    fn name(&self) -> &'static str {
        "invariant_check"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        world
            .check_invariants()
            .with_context(|| format!("invariant violated after turn {}", ctx.turn))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
