//! Static terrain: biome tags, biome carrying capacities, and the oracle the
//! simulation consults for land/ocean classification.

use std::collections::BTreeMap;
use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::TilePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeTag {
    Ocean,
    Ice,
    Tundra,
    Taiga,
    Mountain,
    Desert,
    Savanna,
    Grassland,
    Forest,
    Jungle,
}

impl BiomeTag {
    pub const ALL: [BiomeTag; 10] = [
        BiomeTag::Ocean,
        BiomeTag::Ice,
        BiomeTag::Tundra,
        BiomeTag::Taiga,
        BiomeTag::Mountain,
        BiomeTag::Desert,
        BiomeTag::Savanna,
        BiomeTag::Grassland,
        BiomeTag::Forest,
        BiomeTag::Jungle,
    ];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        let tag = match symbol {
            '~' => BiomeTag::Ocean,
            '*' => BiomeTag::Ice,
            't' => BiomeTag::Tundra,
            'T' => BiomeTag::Taiga,
            '^' => BiomeTag::Mountain,
            'd' => BiomeTag::Desert,
            's' => BiomeTag::Savanna,
            'g' => BiomeTag::Grassland,
            'f' => BiomeTag::Forest,
            'j' => BiomeTag::Jungle,
            _ => return None,
        };
        Some(tag)
    }

    pub fn is_ocean(self) -> bool {
        matches!(self, BiomeTag::Ocean)
    }
}

impl fmt::Display for BiomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BiomeTag::Ocean => "ocean",
            BiomeTag::Ice => "ice",
            BiomeTag::Tundra => "tundra",
            BiomeTag::Taiga => "taiga",
            BiomeTag::Mountain => "mountain",
            BiomeTag::Desert => "desert",
            BiomeTag::Savanna => "savanna",
            BiomeTag::Grassland => "grassland",
            BiomeTag::Forest => "forest",
            BiomeTag::Jungle => "jungle",
        };
        f.write_str(name)
    }
}

/// Biome -> signed carrying capacity. Hostile biomes are negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeTable {
    capacities: BTreeMap<BiomeTag, i32>,
}

impl BiomeTable {
    pub fn capacity(&self, biome: BiomeTag) -> i32 {
        self.capacities.get(&biome).copied().unwrap_or(0)
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<BiomeTag, i32>) -> Self {
        for (biome, capacity) in overrides {
            self.capacities.insert(*biome, *capacity);
        }
        self
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        let capacities = BTreeMap::from([
            (BiomeTag::Ocean, -10),
            (BiomeTag::Ice, -3),
            (BiomeTag::Tundra, 1),
            (BiomeTag::Taiga, 2),
            (BiomeTag::Mountain, 1),
            (BiomeTag::Desert, -1),
            (BiomeTag::Savanna, 3),
            (BiomeTag::Grassland, 4),
            (BiomeTag::Forest, 4),
            (BiomeTag::Jungle, 3),
        ]);
        Self { capacities }
    }
}

/// Read-only view of the world's geography.
pub trait TerrainOracle {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn biome_at(&self, pos: TilePos) -> BiomeTag;

    fn is_ocean(&self, pos: TilePos) -> bool {
        self.biome_at(pos).is_ocean()
    }

    /// A uniformly chosen land tile, or `None` if the map is all ocean.
    fn random_land(&self, rng: &mut dyn RngCore) -> Option<TilePos>;
}

/// In-memory biome raster built from map rows such as `"~~ggf~"`.
#[derive(Debug, Clone)]
pub struct BiomeMap {
    width: u32,
    height: u32,
    biomes: Vec<BiomeTag>,
    land: Vec<TilePos>,
}

impl BiomeMap {
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: width as u32,
                height: height as u32,
            });
        }

        let mut biomes = Vec::with_capacity(width * height);
        let mut land = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(ConfigError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, symbol) in row.chars().enumerate() {
                let biome = BiomeTag::from_symbol(symbol).ok_or(ConfigError::UnknownBiome {
                    symbol,
                    x: x as u32,
                    y: y as u32,
                })?;
                if !biome.is_ocean() {
                    land.push(TilePos::new(x as u32, y as u32));
                }
                biomes.push(biome);
            }
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            biomes,
            land,
        })
    }

    /// A map of a single biome. Handy for tests.
    pub fn uniform(width: u32, height: u32, biome: BiomeTag) -> Result<Self, ConfigError> {
        let symbol = match biome {
            BiomeTag::Ocean => '~',
            BiomeTag::Ice => '*',
            BiomeTag::Tundra => 't',
            BiomeTag::Taiga => 'T',
            BiomeTag::Mountain => '^',
            BiomeTag::Desert => 'd',
            BiomeTag::Savanna => 's',
            BiomeTag::Grassland => 'g',
            BiomeTag::Forest => 'f',
            BiomeTag::Jungle => 'j',
        };
        let row: String = std::iter::repeat(symbol).take(width as usize).collect();
        let rows = vec![row; height as usize];
        Self::from_rows(&rows)
    }

    pub fn land_tiles(&self) -> usize {
        self.land.len()
    }

    /// Tile count per biome, in biome order.
    pub fn census(&self) -> BTreeMap<BiomeTag, usize> {
        let mut counts = BTreeMap::new();
        for biome in &self.biomes {
            *counts.entry(*biome).or_insert(0) += 1;
        }
        counts
    }
}

impl TerrainOracle for BiomeMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn biome_at(&self, pos: TilePos) -> BiomeTag {
        self.biomes[(pos.y * self.width + pos.x) as usize]
    }

    fn random_land(&self, rng: &mut dyn RngCore) -> Option<TilePos> {
        if self.land.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.land.len());
        Some(self.land[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn parses_rows_and_counts_biomes() {
        let map = BiomeMap::from_rows(&["~gg", "~fd"]).unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.biome_at(TilePos::new(2, 1)), BiomeTag::Desert);
        assert!(map.is_ocean(TilePos::new(0, 1)));
        assert_eq!(map.land_tiles(), 4);
        assert_eq!(map.census().get(&BiomeTag::Grassland), Some(&2));
    }

    #[test]
    fn rejects_ragged_and_unknown_rows() {
        assert_eq!(
            BiomeMap::from_rows(&["gg", "g"]).unwrap_err(),
            ConfigError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
        assert!(matches!(
            BiomeMap::from_rows(&["gx"]),
            Err(ConfigError::UnknownBiome { symbol: 'x', .. })
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(
            BiomeMap::from_rows(&empty),
            Err(ConfigError::EmptyGrid { .. })
        ));
    }

    #[test]
    fn random_land_never_returns_ocean() {
        let map = BiomeMap::from_rows(&["~~~~", "~g~~", "~~~j"]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..64 {
            let pos = map.random_land(&mut rng).unwrap();
            assert!(!map.is_ocean(pos));
        }
        let ocean = BiomeMap::uniform(2, 2, BiomeTag::Ocean).unwrap();
        assert_eq!(ocean.random_land(&mut rng), None);
    }

    #[test]
    fn overrides_replace_default_capacity() {
        let overrides = BTreeMap::from([(BiomeTag::Desert, 2)]);
        let table = BiomeTable::default().with_overrides(&overrides);
        assert_eq!(table.capacity(BiomeTag::Desert), 2);
        assert_eq!(table.capacity(BiomeTag::Grassland), 4);
    }
}
