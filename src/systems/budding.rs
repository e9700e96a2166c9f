use rand::Rng;

use crate::population::PopulationId;
use crate::systems::movement::MovementPolicy;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuddingOutcome {
    /// The growth timer has not reached the budding threshold.
    NotReady,
    /// The timer fired but no free tile was found.
    NoRoom,
    /// The timer fired but the registry is at `max_populations`.
    AtCapacity,
    Budded(PopulationId),
}

/// Asexual reproduction for populations that have stayed healthy long
/// enough.
#[derive(Debug, Default)]
pub struct Budding;

impl Budding {
    pub fn new() -> Self {
        Self
    }

    /// Fires `id`'s budding timer if it is due. The timer resets whether or
    /// not a child is actually created.
    pub fn try_bud<R: Rng + ?Sized>(
        &self,
        world: &mut World,
        id: PopulationId,
        movement: &MovementPolicy,
        rng: &mut R,
    ) -> BuddingOutcome {
        let Some(parent) = world.population_mut(id) else {
            return BuddingOutcome::NotReady;
        };
        if parent.full_health_timer < parent.population_budding_timer {
            return BuddingOutcome::NotReady;
        }
        parent.full_health_timer = 0;
        let origin = parent.pos;

        let Some(candidate) = movement.choose_destination(world, id, rng) else {
            return BuddingOutcome::NoRoom;
        };
        if candidate == origin {
            return BuddingOutcome::NoRoom;
        }
        if world.population_count() >= world.constants().max_populations {
            return BuddingOutcome::AtCapacity;
        }

        match world.bud(id, candidate) {
            Some(child) => {
                tracing::trace!(
                    target: "worldsim::budding",
                    parent = %id,
                    %child,
                    at = %candidate,
                    "population budded"
                );
                BuddingOutcome::Budded(child)
            }
            None => BuddingOutcome::NoRoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MovementConfig, SimulationConstants};
    use crate::grid::TilePos;
    use crate::terrain::{BiomeMap, BiomeTable, BiomeTag};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world_with(width: u32, height: u32, max_populations: usize) -> World {
        let map = BiomeMap::uniform(width, height, BiomeTag::Grassland).unwrap();
        let constants = SimulationConstants {
            max_populations,
            ..SimulationConstants::default()
        };
        World::new(Box::new(map), &BiomeTable::default(), constants).unwrap()
    }

    #[test]
    fn budding_fires_exactly_at_threshold_and_resets() {
        let mut world = world_with(10, 10, 1000);
        let parent = world.found(TilePos::new(5, 5)).unwrap();
        let threshold = world.population(parent).unwrap().population_budding_timer;
        let movement = MovementPolicy::new(MovementConfig::default());
        let budding = Budding::new();
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        world.population_mut(parent).unwrap().full_health_timer = threshold - 1;
        assert_eq!(
            budding.try_bud(&mut world, parent, &movement, &mut rng),
            BuddingOutcome::NotReady
        );
        assert_eq!(world.population(parent).unwrap().full_health_timer, threshold - 1);

        world.population_mut(parent).unwrap().full_health_timer = threshold;
        let outcome = budding.try_bud(&mut world, parent, &movement, &mut rng);
        assert_ne!(outcome, BuddingOutcome::NotReady);
        assert_eq!(world.population(parent).unwrap().full_health_timer, 0);
        world.check_invariants().unwrap();
    }

    #[test]
    fn timer_resets_even_when_capped() {
        let mut world = world_with(10, 10, 1);
        let parent = world.found(TilePos::new(5, 5)).unwrap();
        let movement = MovementPolicy::new(MovementConfig::default());
        let budding = Budding::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        for _ in 0..20 {
            let threshold = world.population(parent).unwrap().population_budding_timer;
            world.population_mut(parent).unwrap().full_health_timer = threshold;
            let outcome = budding.try_bud(&mut world, parent, &movement, &mut rng);
            assert!(matches!(
                outcome,
                BuddingOutcome::AtCapacity | BuddingOutcome::NoRoom
            ));
            assert_eq!(world.population(parent).unwrap().full_health_timer, 0);
        }
        assert_eq!(world.population_count(), 1);
    }

    #[test]
    fn child_inherits_culture_on_a_new_tile() {
        let mut world = world_with(10, 10, 1000);
        let parent = world.found(TilePos::new(5, 5)).unwrap();
        let movement = MovementPolicy::new(MovementConfig::default());
        let budding = Budding::new();
        let mut rng = ChaCha8Rng::seed_from_u64(17);

        let child = loop {
            let threshold = world.population(parent).unwrap().population_budding_timer;
            world.population_mut(parent).unwrap().full_health_timer = threshold;
            if let BuddingOutcome::Budded(child) =
                budding.try_bud(&mut world, parent, &movement, &mut rng)
            {
                break child;
            }
        };
        let parent_pop = world.population(parent).unwrap();
        let child_pop = world.population(child).unwrap();
        assert_ne!(child_pop.pos, parent_pop.pos);
        assert_eq!(child_pop.culture, parent_pop.culture);
        assert_eq!(child_pop.full_health_timer, 0);
        world.check_invariants().unwrap();
    }
}
