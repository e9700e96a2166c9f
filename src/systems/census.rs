use std::any::Any;
use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    systems::culture::CultureId,
    world::World,
};

/// How culturally unified the world is at the end of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureCensus {
    pub turn: u64,
    pub populations: usize,
    /// Number of distinct predominant cultures.
    pub distinct_cultures: usize,
    /// The most widespread predominant culture and how many hold it.
    pub dominant: Option<(u64, usize)>,
}

impl CultureCensus {
    pub fn take(world: &World) -> Self {
        let mut holders: BTreeMap<CultureId, usize> = BTreeMap::new();
        for population in world.populations().iter() {
            if let Some(culture) = population.culture.predominant() {
                *holders.entry(culture).or_insert(0) += 1;
            }
        }
        let mut dominant: Option<(CultureId, usize)> = None;
        for (culture, count) in &holders {
            match dominant {
                Some((_, best)) if *count <= best => {}
                _ => dominant = Some((*culture, *count)),
            }
        }
        Self {
            turn: world.turn(),
            populations: world.population_count(),
            distinct_cultures: holders.len(),
            dominant: dominant.map(|(culture, count)| (culture.raw(), count)),
        }
    }
}

/// Records a `CultureCensus` every turn.
#[derive(Default)]
pub struct CultureCensusSystem {
    history: Vec<CultureCensus>,
}

impl CultureCensusSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&CultureCensus> {
        self.history.last()
    }

    pub fn history(&self) -> &[CultureCensus] {
        &self.history
    }
}

impl System for CultureCensusSystem {
    fn name(&self) -> &'static str {
        "culture_census"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let census = CultureCensus::take(world);
        tracing::debug!(
            target: "worldsim::census",
            turn = census.turn,
            distinct_cultures = census.distinct_cultures,
            "culture census"
        );
        self.history.push(census);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConstants;
    use crate::grid::TilePos;
    use crate::terrain::{BiomeMap, BiomeTable, BiomeTag};

    #[test]
    fn counts_predominant_cultures() {
        let map = BiomeMap::uniform(6, 6, BiomeTag::Grassland).unwrap();
        let mut world =
            World::new(Box::new(map), &BiomeTable::default(), SimulationConstants::default())
                .unwrap();
        let a = world.found(TilePos::new(0, 0)).unwrap();
        world.bud(a, TilePos::new(3, 3)).unwrap();
        world.found(TilePos::new(5, 5)).unwrap();

        let census = CultureCensus::take(&world);
        assert_eq!(census.populations, 3);
        assert_eq!(census.distinct_cultures, 2);
        assert_eq!(census.dominant, Some((a.raw(), 2)));
    }
}
