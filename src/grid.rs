//! Tile grid with crowdedness accounting and an occupancy index.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::InfluenceKernel;
use crate::population::PopulationId;
use crate::terrain::{BiomeTable, BiomeTag, TerrainOracle};

/// Tile position in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: TilePos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub pos: TilePos,
    pub biome: BiomeTag,
    pub carrying_capacity: i32,
    pub crowdedness: f64,
    pub occupant: Option<PopulationId>,
}

impl Tile {
    /// `crowdedness - carrying_capacity`; positive means over capacity.
    pub fn overflow(&self) -> f64 {
        self.crowdedness - self.carrying_capacity as f64
    }
}

/// Bitmap of occupied cells, used for windowed neighbour queries.
#[derive(Debug, Clone)]
pub struct OccupancyIndex {
    width: u32,
    cells: Vec<bool>,
}

impl OccupancyIndex {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            cells: vec![false; (width * height) as usize],
        }
    }

    pub fn is_occupied(&self, pos: TilePos) -> bool {
        self.cells[(pos.y * self.width + pos.x) as usize]
    }

    fn set(&mut self, pos: TilePos, occupied: bool) {
        self.cells[(pos.y * self.width + pos.x) as usize] = occupied;
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }
}

pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    occupancy: OccupancyIndex,
}

impl Grid {
    pub fn from_terrain(terrain: &dyn TerrainOracle, table: &BiomeTable) -> Result<Self, ConfigError> {
        let (width, height) = (terrain.width(), terrain.height());
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let pos = TilePos::new(x, y);
                let biome = terrain.biome_at(pos);
                tiles.push(Tile {
                    pos,
                    biome,
                    carrying_capacity: table.capacity(biome),
                    crowdedness: 0.0,
                    occupant: None,
                });
            }
        }
        Ok(Self {
            width,
            height,
            tiles,
            occupancy: OccupancyIndex::new(width, height),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_count(&self) -> u32 {
        self.width * self.height
    }

    /// Position offset by `(dx, dy)`, or `None` when it leaves the grid.
    pub fn offset(&self, pos: TilePos, dx: i32, dy: i32) -> Option<TilePos> {
        let x = pos.x as i64 + dx as i64;
        let y = pos.y as i64 + dy as i64;
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            None
        } else {
            Some(TilePos::new(x as u32, y as u32))
        }
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn tile(&self, pos: TilePos) -> &Tile {
        &self.tiles[self.index(pos)]
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> &mut Tile {
        let index = self.index(pos);
        &mut self.tiles[index]
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn is_ocean(&self, pos: TilePos) -> bool {
        self.tile(pos).biome.is_ocean()
    }

    pub fn is_occupied(&self, pos: TilePos) -> bool {
        self.occupancy.is_occupied(pos)
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    /// Adds (`sign = 1.0`) or removes (`sign = -1.0`) a kernel footprint
    /// centred on `center`. The centre tile itself is never touched.
    pub fn apply_influence(&mut self, center: TilePos, kernel: &InfluenceKernel, sign: f64) {
        for (dx, dy, weight) in kernel.offsets() {
            if let Some(pos) = self.offset(center, dx, dy) {
                self.tile_mut(pos).crowdedness += sign * weight as f64;
            }
        }
    }

    /// Marks `pos` occupied by `id` in both the tile and the index.
    pub(crate) fn set_occupant(&mut self, pos: TilePos, id: PopulationId) {
        self.tile_mut(pos).occupant = Some(id);
        self.occupancy.set(pos, true);
    }

    pub(crate) fn clear_occupant(&mut self, pos: TilePos) {
        self.tile_mut(pos).occupant = None;
        self.occupancy.set(pos, false);
    }

    /// Occupied cells in the square window of `radius` around `center`,
    /// clipped to the grid, in row-major order. The centre is excluded.
    pub fn occupied_within(&self, center: TilePos, radius: u32) -> Vec<(TilePos, PopulationId)> {
        let x0 = center.x.saturating_sub(radius);
        let y0 = center.y.saturating_sub(radius);
        let x1 = (center.x + radius).min(self.width - 1);
        let y1 = (center.y + radius).min(self.height - 1);
        let mut found = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let pos = TilePos::new(x, y);
                if pos == center || !self.occupancy.is_occupied(pos) {
                    continue;
                }
                if let Some(id) = self.tile(pos).occupant {
                    found.push((pos, id));
                }
            }
        }
        found
    }

    fn index(&self, pos: TilePos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }
}
