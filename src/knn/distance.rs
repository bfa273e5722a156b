// src/knn/distance.rs

use log::debug;
use crate::error::{Error, Result};
use crate::types::{Point, PointSet};

/// Euclidean distance between two points.
///
/// Symmetric bit for bit: the squared differences do not depend on operand order.
#[inline]
pub fn euclidean(a: &Point, b: &Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Upper-triangular cache of every pairwise distance in a point set.
///
/// Each unordered pair is written exactly once, by `build`, and looked up
/// through `get` in either argument order.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Unordered pairs among `n` points, or `None` on overflow.
    pub fn pair_count(n: usize) -> Option<usize> {
        n.checked_mul(n.saturating_sub(1)).map(|pairs| pairs / 2)
    }

    /// Bytes needed to cache `n` points, or `None` on overflow.
    pub fn bytes_required(n: usize) -> Option<usize> {
        Self::pair_count(n).and_then(|pairs| pairs.checked_mul(std::mem::size_of::<f64>()))
    }

    pub fn build(points: &PointSet) -> Result<Self> {
        let n = points.len();
        let pairs = Self::pair_count(n).ok_or_else(|| {
            Error::invalid_state(format!("distance cache for {} points overflows the address space", n))
        })?;
        let mut values = Vec::with_capacity(pairs);
        let slice = points.as_slice();

        for (i, a) in slice.iter().enumerate() {
            for b in &slice[i + 1..] {
                values.push(euclidean(a, b));
            }
        }

        debug!("Cached {} pairwise distances for {} points", values.len(), n);
        Ok(Self { n, values })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j`. Self-distance is never cached.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i != j, "self-distance is not stored");
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        self.values[self.offset(lo, hi)]
    }

    #[inline]
    fn offset(&self, lo: usize, hi: usize) -> usize {
        // Rows 0..lo hold (n-1) + (n-2) + ... + (n-lo) entries.
        lo * self.n - lo * (lo + 1) / 2 + (hi - lo - 1)
    }
}
