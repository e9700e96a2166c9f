use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::config::CombatConfig;
use crate::population::PopulationId;
use crate::world::World;

/// Damage dealt in one clash, before either side is checked for death.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub attacker: PopulationId,
    pub defender: PopulationId,
    pub attacker_damage: f64,
    pub defender_damage: f64,
}

pub struct ConflictResolver {
    config: CombatConfig,
}

impl ConflictResolver {
    pub fn new(config: CombatConfig) -> Self {
        Self { config }
    }

    /// The weakest occupant within `id`'s conflict search radius, if `id`'s
    /// tile is over capacity and that occupant is weak enough to be worth
    /// attacking. Tiles are scanned row-major; ties keep the first found.
    /// The attacker's own tile is never part of the search.
    pub fn find_target(&self, world: &World, id: PopulationId) -> Option<PopulationId> {
        let attacker = world.population(id)?;
        if world.grid().tile(attacker.pos).overflow() <= 0.0 {
            return None;
        }

        let mut weakest: Option<(PopulationId, f64)> = None;
        for (_, other) in world
            .grid()
            .occupied_within(attacker.pos, attacker.conflict_search_radius)
        {
            if other == id {
                continue;
            }
            let Some(candidate) = world.population(other) else {
                continue;
            };
            match weakest {
                Some((_, lowest)) if candidate.health >= lowest => {}
                _ => weakest = Some((other, candidate.health)),
            }
        }

        let (target, health) = weakest?;
        (health < attacker.health + attacker.conflict_health_discrepancy_threshold).then_some(target)
    }

    /// Rolls a clash between `attacker` and `defender` and applies the
    /// damage. Neither side can gain health.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        world: &mut World,
        attacker: PopulationId,
        defender: PopulationId,
        rng: &mut R,
    ) -> Option<CombatResult> {
        let attacker_health = world.population(attacker)?.health;
        let defender_health = world.population(defender)?.health;
        let spread = self.config.variance.sqrt();

        let health_diff = defender_health - attacker_health;
        let z_diff: f64 = rng.sample(StandardNormal);
        let z_total: f64 = rng.sample(StandardNormal);
        let differential = (health_diff + spread * z_diff).round();
        let total = (self.config.avg_total_damage + spread * z_total).round();

        let attacker_damage = (total / 2.0 + differential).max(0.0);
        let defender_damage = (total / 2.0 - differential).max(0.0);

        world.population_mut(attacker)?.health -= attacker_damage;
        world.population_mut(defender)?.health -= defender_damage;

        tracing::trace!(
            target: "worldsim::conflict",
            %attacker,
            %defender,
            attacker_damage,
            defender_damage,
            "combat resolved"
        );

        Some(CombatResult {
            attacker,
            defender,
            attacker_damage,
            defender_damage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConstants;
    use crate::grid::TilePos;
    use crate::terrain::{BiomeMap, BiomeTable, BiomeTag};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn crowded_world() -> World {
        let map = BiomeMap::uniform(12, 12, BiomeTag::Desert).unwrap();
        World::new(Box::new(map), &BiomeTable::default(), SimulationConstants::default()).unwrap()
    }

    fn set_health(world: &mut World, id: PopulationId, health: f64) {
        world.population_mut(id).unwrap().health = health;
    }

    #[test]
    fn no_conflict_under_capacity() {
        let map = BiomeMap::uniform(12, 12, BiomeTag::Grassland).unwrap();
        let mut world =
            World::new(Box::new(map), &BiomeTable::default(), SimulationConstants::default())
                .unwrap();
        let a = world.found(TilePos::new(2, 2)).unwrap();
        world.found(TilePos::new(9, 9)).unwrap();
        // a's tile receives no footprint from the distant population
        let resolver = ConflictResolver::new(CombatConfig::default());
        assert_eq!(resolver.find_target(&world, a), None);
    }

    #[test]
    fn picks_weakest_qualifying_neighbour() {
        let mut world = crowded_world();
        let a = world.found(TilePos::new(5, 5)).unwrap();
        let b = world.found(TilePos::new(6, 5)).unwrap();
        let c = world.found(TilePos::new(5, 7)).unwrap();
        let far = world.found(TilePos::new(11, 11)).unwrap();
        set_health(&mut world, a, 10.0);
        set_health(&mut world, b, 6.0);
        set_health(&mut world, c, 2.0);
        set_health(&mut world, far, 1.0);

        let resolver = ConflictResolver::new(CombatConfig::default());
        assert!(world.grid().tile(TilePos::new(5, 5)).overflow() > 0.0);
        assert_eq!(resolver.find_target(&world, a), Some(c));
    }

    #[test]
    fn stronger_neighbours_do_not_qualify() {
        let mut world = crowded_world();
        let a = world.found(TilePos::new(5, 5)).unwrap();
        let b = world.found(TilePos::new(6, 6)).unwrap();
        set_health(&mut world, a, 4.0);
        set_health(&mut world, b, 6.0);
        let resolver = ConflictResolver::new(CombatConfig::default());
        assert_eq!(resolver.find_target(&world, a), None);

        set_health(&mut world, b, 5.9);
        assert_eq!(resolver.find_target(&world, a), Some(b));
    }

    #[test]
    fn combat_only_ever_removes_health() {
        let mut world = crowded_world();
        let a = world.found(TilePos::new(5, 5)).unwrap();
        let b = world.found(TilePos::new(6, 5)).unwrap();
        let resolver = ConflictResolver::new(CombatConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for _ in 0..100 {
            set_health(&mut world, a, 10.0);
            set_health(&mut world, b, 2.0);
            let result = resolver.resolve(&mut world, a, b, &mut rng).unwrap();
            assert!(result.attacker_damage >= 0.0);
            assert!(result.defender_damage >= 0.0);
            assert_eq!(world.population(a).unwrap().health + result.attacker_damage, 10.0);
            assert_eq!(world.population(b).unwrap().health + result.defender_damage, 2.0);
        }
    }

    #[test]
    fn equal_weakest_neighbours_resolve_in_row_major_order() {
        let mut world = crowded_world();
        let a = world.found(TilePos::new(5, 5)).unwrap();
        // founded first, but scanned later: row 6 comes after row 5
        let lower_row = world.found(TilePos::new(4, 6)).unwrap();
        let same_row = world.found(TilePos::new(6, 5)).unwrap();
        set_health(&mut world, a, 10.0);
        set_health(&mut world, lower_row, 6.0);
        set_health(&mut world, same_row, 6.0);

        let resolver = ConflictResolver::new(CombatConfig::default());
        assert_eq!(resolver.find_target(&world, a), Some(same_row));

        set_health(&mut world, lower_row, 5.5);
        assert_eq!(resolver.find_target(&world, a), Some(lower_row));
    }
}
