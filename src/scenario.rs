use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::info;

use crate::{
    config::SimulationConstants,
    grid::TilePos,
    terrain::{BiomeMap, BiomeTable, BiomeTag, TerrainOracle},
    world::World,
};

fn default_ticks() -> u64 {
    200
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    /// One string per row, one biome symbol per tile.
    pub map: Vec<String>,
    /// Per-biome carrying capacity overrides.
    #[serde(default)]
    pub biome_capacities: BTreeMap<BiomeTag, i32>,
    #[serde(default)]
    pub founders: Vec<ScenarioFounder>,
    #[serde(default)]
    pub constants: SimulationConstants,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScenarioFounder {
    pub x: u32,
    pub y: u32,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Builds the grid and places the founders. With no founders listed a
    /// single one is placed on random land, chosen from the scenario seed.
    pub fn build_world(&self) -> Result<World> {
        let map = BiomeMap::from_rows(&self.map)
            .with_context(|| format!("scenario '{}' has an invalid map", self.name))?;
        let census = map.census();
        info!(
            target: "worldsim::scenario",
            scenario = %self.name,
            width = map.width(),
            height = map.height(),
            land = map.land_tiles(),
            "loaded map"
        );
        for (biome, count) in &census {
            info!(target: "worldsim::scenario", %biome, count, "biome census");
        }

        let table = BiomeTable::default().with_overrides(&self.biome_capacities);
        let mut world = World::new(Box::new(map), &table, self.constants.clone())
            .with_context(|| format!("scenario '{}' has invalid constants", self.name))?;

        if self.founders.is_empty() {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            world
                .found_on_random_land(&mut rng)
                .context("no land to place the founding population on")?;
        }
        for founder in &self.founders {
            world
                .found(TilePos::new(founder.x, founder.y))
                .with_context(|| format!("scenario '{}' has an invalid founder", self.name))?;
        }
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }
}
