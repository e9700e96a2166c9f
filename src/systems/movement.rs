use rand::Rng;

use crate::config::MovementConfig;
use crate::grid::TilePos;
use crate::population::{HealthState, PopulationId};
use crate::world::World;

/// Picks where a population goes next from its health and the crowdedness
/// around it.
pub struct MovementPolicy {
    config: MovementConfig,
}

impl MovementPolicy {
    pub fn new(config: MovementConfig) -> Self {
        Self { config }
    }

    /// Destination for `id`. Returns the current tile when no move is taken.
    ///
    /// The caller vacates the population first when moving it, so its own
    /// footprint is not part of the crowdedness it reads.
    pub fn choose_destination<R: Rng + ?Sized>(
        &self,
        world: &World,
        id: PopulationId,
        rng: &mut R,
    ) -> Option<TilePos> {
        let population = world.population(id)?;
        let origin = population.pos;
        let overflow = world.grid().tile(origin).overflow();
        let state = population.health_state(&self.config);

        let destination = if overflow < 0.0 || state == HealthState::Healthy {
            self.random_step(world, origin, rng)
        } else if state == HealthState::Weak {
            self.sample_from_vicinity(
                world,
                origin,
                self.config.weak_samples,
                self.config.weak_radius,
                rng,
            )
        } else {
            self.sample_from_vicinity(
                world,
                origin,
                self.config.desperate_samples,
                self.config.desperate_radius,
                rng,
            )
        };
        Some(destination)
    }

    /// One uniform offset within the default radius. Rejected (stay put) if
    /// it leaves the grid, lands on ocean or on an occupied tile.
    pub fn random_step<R: Rng + ?Sized>(&self, world: &World, origin: TilePos, rng: &mut R) -> TilePos {
        let r = self.config.default_radius as i32;
        let dx = rng.gen_range(-r..=r);
        let dy = rng.gen_range(-r..=r);
        match world.grid().offset(origin, dx, dy) {
            Some(candidate) if world.is_free_land(candidate) => candidate,
            _ => origin,
        }
    }

    /// Best-of-`samples` random search for a less crowded tile within
    /// `radius`. A candidate wins if it is free land with crowdedness no
    /// greater than the best so far, so later samples win ties.
    pub fn sample_from_vicinity<R: Rng + ?Sized>(
        &self,
        world: &World,
        origin: TilePos,
        samples: u32,
        radius: u32,
        rng: &mut R,
    ) -> TilePos {
        let grid = world.grid();
        let r = radius as i32;
        let mut best = origin;
        let mut best_crowdedness = grid.tile(origin).crowdedness;
        for _ in 0..samples {
            let dx = rng.gen_range(-r..=r);
            let dy = rng.gen_range(-r..=r);
            let Some(candidate) = grid.offset(origin, dx, dy) else {
                continue;
            };
            if !world.is_free_land(candidate) {
                continue;
            }
            let crowdedness = grid.tile(candidate).crowdedness;
            if crowdedness <= best_crowdedness {
                best = candidate;
                best_crowdedness = crowdedness;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConstants;
    use crate::terrain::{BiomeMap, BiomeTable};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world(rows: &[&str]) -> World {
        let map = BiomeMap::from_rows(rows).unwrap();
        World::new(Box::new(map), &BiomeTable::default(), SimulationConstants::default()).unwrap()
    }

    #[test]
    fn destinations_stay_on_free_land_in_bounds() {
        let mut world = world(&[
            "~~~~~~~~~~",
            "~gggg~~gg~",
            "~gggg~~gg~",
            "~~gg~~~~~~",
            "~~~~~~~~~~",
        ]);
        let pop = world.found(TilePos::new(2, 2)).unwrap();
        world.found(TilePos::new(3, 1)).unwrap();
        let policy = MovementPolicy::new(MovementConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for health in [20.0, 10.0, 3.0] {
            world.population_mut(pop).unwrap().health = health;
            world.vacate(pop);
            for _ in 0..200 {
                let dest = policy.choose_destination(&world, pop, &mut rng).unwrap();
                assert!(world.grid().contains(dest));
                assert!(!world.grid().is_ocean(dest));
                assert_ne!(dest, TilePos::new(3, 1), "occupied tile chosen");
            }
            world.place(pop);
        }
    }

    #[test]
    fn vicinity_sampling_prefers_less_crowded_tiles() {
        let mut world = world(&["ggggggg"; 7]);
        let origin = TilePos::new(3, 3);
        for tile in [(2, 2), (3, 2), (4, 2), (2, 3), (4, 3), (2, 4), (3, 4), (4, 4)] {
            world.grid_mut().tile_mut(TilePos::new(tile.0, tile.1)).crowdedness = 1.0;
        }
        world.grid_mut().tile_mut(origin).crowdedness = 5.0;
        let policy = MovementPolicy::new(MovementConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let best = policy.sample_from_vicinity(&world, origin, 200, 3, &mut rng);
        assert_eq!(world.grid().tile(best).crowdedness, 0.0);
    }

    #[test]
    fn vicinity_sampling_keeps_origin_when_everything_is_worse() {
        let mut world = world(&["ggg"; 3]);
        let origin = TilePos::new(1, 1);
        for y in 0..3 {
            for x in 0..3 {
                world.grid_mut().tile_mut(TilePos::new(x, y)).crowdedness = 9.0;
            }
        }
        world.grid_mut().tile_mut(origin).crowdedness = 2.0;
        let policy = MovementPolicy::new(MovementConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(policy.sample_from_vicinity(&world, origin, 50, 1, &mut rng), origin);
        assert_eq!(policy.sample_from_vicinity(&world, origin, 0, 9, &mut rng), origin);
    }

    #[test]
    fn healthy_population_on_island_stays_put() {
        let mut world = world(&["~~~~~", "~~~~~", "~~g~~", "~~~~~", "~~~~~"]);
        let pop = world.found(TilePos::new(2, 2)).unwrap();
        world.vacate(pop);
        let policy = MovementPolicy::new(MovementConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(
                policy.choose_destination(&world, pop, &mut rng),
                Some(TilePos::new(2, 2))
            );
        }
    }

    #[test]
    fn vicinity_ties_go_to_the_last_sample() {
        let world = world(&["ggggggg"; 7]);
        let origin = TilePos::new(3, 3);
        let policy = MovementPolicy::new(MovementConfig::default());

        for seed in 0..10 {
            // every tile is free land at crowdedness 0, so every sample ties
            let mut replay = ChaCha8Rng::seed_from_u64(seed);
            let mut last = origin;
            for _ in 0..4 {
                let dx = replay.gen_range(-2..=2);
                let dy = replay.gen_range(-2..=2);
                last = world.grid().offset(origin, dx, dy).unwrap();
            }

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let chosen = policy.sample_from_vicinity(&world, origin, 4, 2, &mut rng);
            assert_eq!(chosen, last, "seed {seed}");
        }
    }
}
