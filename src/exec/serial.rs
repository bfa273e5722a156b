// src/exec/serial.rs

use std::time::Instant;
use log::{debug, info};
use serde::{Serialize, Deserialize};
use crate::error::Result;
use crate::knn::{scan_range, validate_run, ClusterBuilder, DistanceMatrix, IndexRange, Reducer};
use crate::types::PointSet;
use super::{Executor, RunOutcome, Strategy};

/// When the serial strategy caches the pairwise distance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachePolicy {
    Never,
    Always,
    /// Cache when the matrix fits in `max_bytes` and in half of the
    /// memory the system reports as available.
    Auto { max_bytes: usize },
}

impl CachePolicy {
    pub fn should_cache(&self, n: usize) -> bool {
        match *self {
            CachePolicy::Never => false,
            CachePolicy::Always => true,
            CachePolicy::Auto { max_bytes } => {
                let required = match DistanceMatrix::bytes_required(n) {
                    Some(bytes) => bytes,
                    None => return false,
                };
                if required > max_bytes {
                    return false;
                }
                match sys_info::mem_info() {
                    // mem_info reports KB
                    Ok(mem) => (mem.avail as u128 * 1024) / 2 >= required as u128,
                    Err(_) => true,
                }
            },
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Auto { max_bytes: 512 * 1024 * 1024 }
    }
}

/// Single worker owning every reference index.
#[derive(Debug, Clone)]
pub struct SerialExecutor {
    min_points: usize,
    cache: CachePolicy,
}

impl SerialExecutor {
    pub fn new(min_points: usize, cache: CachePolicy) -> Self {
        Self { min_points, cache }
    }
}

impl Executor for SerialExecutor {
    fn strategy(&self) -> Strategy {
        Strategy::Serial
    }

    fn validate(&self, n: usize, k: usize) -> Result<()> {
        validate_run(n, k, 1, self.min_points)
    }

    fn execute(&self, points: &PointSet, k: usize) -> Result<RunOutcome> {
        let n = points.len();
        self.validate(n, k)?;
        info!("Serial run: N = {}, k = {}", n, k);

        let start = Instant::now();
        let matrix = if self.cache.should_cache(n) {
            debug!("Caching distance matrix for {} points", n);
            Some(DistanceMatrix::build(points)?)
        } else {
            debug!("Evaluating distances on demand");
            None
        };

        let builder = match &matrix {
            Some(matrix) => ClusterBuilder::with_cache(points, k, matrix)?,
            None => ClusterBuilder::new(points, k),
        };
        let local = scan_range(&builder, IndexRange { rank: 0, start: 0, end: n })?;
        let result = Reducer::reduce_sequential(vec![local])?;
        let elapsed = start.elapsed();

        Ok(RunOutcome {
            strategy: Strategy::Serial,
            workers: 1,
            result,
            elapsed,
            collectives: 0,
        })
    }
}
