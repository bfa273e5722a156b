// src/exec/shared.rs

use std::time::Instant;
use log::{debug, info};
use rayon::prelude::*;
use crate::error::Result;
use crate::knn::{
    scan_range, validate_run, ClusterBuilder, Partitioner, Reducer, ReductionMode, SplitRule,
};
use crate::types::{PointSet, WorkerResult};
use super::{Executor, RunOutcome, Strategy};

/// Fixed-size thread pool over a shared, read-only point set.
///
/// Each thread owns one contiguous range of reference indices and returns its
/// local best by value; `collect` is the barrier before reduction.
#[derive(Debug, Clone)]
pub struct SharedMemoryExecutor {
    threads: usize,
    min_points: usize,
    split_rule: SplitRule,
    reduction: ReductionMode,
}

impl SharedMemoryExecutor {
    pub fn new(threads: usize, min_points: usize) -> Self {
        Self {
            threads,
            min_points,
            split_rule: SplitRule::default(),
            reduction: ReductionMode::default(),
        }
    }

    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }

    pub fn with_reduction(mut self, reduction: ReductionMode) -> Self {
        self.reduction = reduction;
        self
    }
}

impl Executor for SharedMemoryExecutor {
    fn strategy(&self) -> Strategy {
        Strategy::SharedMemory
    }

    fn validate(&self, n: usize, k: usize) -> Result<()> {
        validate_run(n, k, self.threads, self.min_points)?;
        Partitioner::new(n, self.threads, self.split_rule)?;
        Ok(())
    }

    fn execute(&self, points: &PointSet, k: usize) -> Result<RunOutcome> {
        let n = points.len();
        self.validate(n, k)?;
        let partitioner = Partitioner::new(n, self.threads, self.split_rule)?;
        let ranges = partitioner.ranges();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("knn-worker-{}", i))
            .build()?;

        info!("Shared-memory run: N = {}, k = {}, {} threads, {} split, {} reduction",
            n, k, self.threads, self.split_rule.as_str(), self.reduction.as_str());

        let start = Instant::now();
        let builder = ClusterBuilder::new(points, k);
        let result = pool.install(|| {
            let locals: Vec<WorkerResult> = ranges
                .par_iter()
                .map(|range| scan_range(&builder, *range))
                .collect::<Result<Vec<_>>>()?;
            debug!("All {} threads joined", locals.len());
            Reducer::reduce(locals, self.reduction)
        })?;
        let elapsed = start.elapsed();

        Ok(RunOutcome {
            strategy: Strategy::SharedMemory,
            workers: self.threads,
            result,
            elapsed,
            collectives: 0,
        })
    }
}
