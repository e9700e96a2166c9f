//! Influence kernels: the footprint a population projects onto nearby tiles.

use std::collections::HashMap;
use std::sync::Arc;

/// A `(2r+1) x (2r+1)` weight matrix centred on the population's tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluenceKernel {
    radius: u32,
    weights: Vec<u32>,
}

impl InfluenceKernel {
    /// Builds the kernel for `radius`.
    ///
    /// Radii below 3 weigh every cell 1. From radius 3 up the weights form
    /// concentric square rings: 3 at Chebyshev distance 1, 2 at distance 2 and
    /// 1 beyond. The centre is always 0.
    pub fn new(radius: u32) -> Self {
        let side = (2 * radius + 1) as usize;
        let mut weights = Vec::with_capacity(side * side);
        let r = radius as i32;
        for dx in -r..=r {
            for dy in -r..=r {
                let ring = dx.unsigned_abs().max(dy.unsigned_abs());
                let weight = match (radius < 3, ring) {
                    (_, 0) => 0,
                    (true, _) => 1,
                    (false, 1) => 3,
                    (false, 2) => 2,
                    (false, _) => 1,
                };
                weights.push(weight);
            }
        }
        Self { radius, weights }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn side(&self) -> usize {
        (2 * self.radius + 1) as usize
    }

    /// Weight at offset `(dx, dy)` from the centre. Offsets outside the
    /// kernel weigh nothing.
    pub fn weight(&self, dx: i32, dy: i32) -> u32 {
        let r = self.radius as i32;
        if dx.abs() > r || dy.abs() > r {
            return 0;
        }
        let side = self.side();
        self.weights[(dx + r) as usize * side + (dy + r) as usize]
    }

    /// Non-centre offsets and their weights.
    pub fn offsets(&self) -> impl Iterator<Item = (i32, i32, u32)> + '_ {
        let r = self.radius as i32;
        (-r..=r)
            .flat_map(move |dx| (-r..=r).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| (dx, dy, self.weight(dx, dy)))
    }

    pub fn total_weight(&self) -> u32 {
        self.weights.iter().sum()
    }
}

/// Memoises kernels by radius so populations with equal radii share one.
#[derive(Debug, Default)]
pub struct KernelCache {
    kernels: HashMap<u32, Arc<InfluenceKernel>>,
}

impl KernelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, radius: u32) -> Arc<InfluenceKernel> {
        self.kernels
            .entry(radius)
            .or_insert_with(|| Arc::new(InfluenceKernel::new(radius)))
            .clone()
    }
}
