pub mod comm;
pub mod serial;
pub mod shared;
pub mod distributed;

use std::time::Duration;
use log::{info, warn};
use serde::{Serialize, Deserialize};
use crate::config::subsystems::ExecutorConfig;
use crate::error::Result;
use crate::types::{GlobalResult, PointSet};

pub use self::serial::{CachePolicy, SerialExecutor};
pub use self::shared::SharedMemoryExecutor;
pub use self::distributed::DistributedExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    Serial,
    SharedMemory,
    Distributed,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Serial, Strategy::SharedMemory, Strategy::Distributed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Serial => "serial",
            Strategy::SharedMemory => "shared",
            Strategy::Distributed => "distributed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').trim().to_lowercase().as_str() {
            "serial" => Some(Self::Serial),
            "shared" | "shared-memory" | "threads" => Some(Self::SharedMemory),
            "distributed" | "processes" => Some(Self::Distributed),
            _ => None,
        }
    }
}

/// Everything one run hands back to the result consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub strategy: Strategy,
    pub workers: usize,
    pub result: GlobalResult,
    /// Compute and reduction time only.
    pub elapsed: Duration,
    /// Collective operations performed; zero outside the distributed model.
    pub collectives: usize,
}

pub trait Executor: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Check N, k and the worker layout without computing any distance.
    fn validate(&self, n: usize, k: usize) -> Result<()>;

    /// Validate, compute every candidate cluster, and reduce to the global best.
    fn execute(&self, points: &PointSet, k: usize) -> Result<RunOutcome>;
}

/// Build the executor for `strategy` from configuration, sizing the worker
/// count against a point set of `n` points.
pub fn build_executor(
    strategy: Strategy,
    config: &ExecutorConfig,
    n: usize,
    min_points: usize,
) -> Box<dyn Executor> {
    let workers = config.worker_count(n);
    match strategy {
        Strategy::Serial => Box::new(SerialExecutor::new(min_points, config.cache_policy())),
        Strategy::SharedMemory => Box::new(
            SharedMemoryExecutor::new(workers, min_points)
                .with_split_rule(config.split_rule)
                .with_reduction(config.reduction),
        ),
        Strategy::Distributed => Box::new(
            DistributedExecutor::new(workers, min_points).with_split_rule(config.split_rule),
        ),
    }
}

/// Whether two results name the same cluster: same reference, same average
/// and the same multiset of neighbor distances.
pub fn same_cluster(a: &GlobalResult, b: &GlobalResult) -> bool {
    a.reference() == b.reference()
        && a.best_average().to_bits() == b.best_average().to_bits()
        && a.best.sorted_distances() == b.best.sorted_distances()
}

/// Outcomes of running several strategies over the same input.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub outcomes: Vec<RunOutcome>,
}

impl Comparison {
    pub fn agree(&self) -> bool {
        match self.outcomes.split_first() {
            Some((first, rest)) => rest.iter().all(|o| same_cluster(&first.result, &o.result)),
            None => true,
        }
    }
}

/// Run each strategy in turn on the same points, stopping at the first error.
pub fn run_all(
    strategies: &[Strategy],
    points: &PointSet,
    k: usize,
    config: &ExecutorConfig,
    min_points: usize,
) -> Result<Comparison> {
    let executors: Vec<Box<dyn Executor>> = strategies
        .iter()
        .map(|&strategy| build_executor(strategy, config, points.len(), min_points))
        .collect();
    run_executors(&executors, points, k)
}

/// Every executor is validated before any of them runs, so a bad worker
/// count for one strategy is reported before another does its scan.
pub fn run_executors(executors: &[Box<dyn Executor>], points: &PointSet, k: usize) -> Result<Comparison> {
    let n = points.len();
    for executor in executors {
        executor.validate(n, k)?;
    }

    let mut outcomes = Vec::with_capacity(executors.len());
    for executor in executors {
        let outcome = executor.execute(points, k)?;
        info!("{} finished in {:.6}s with {} workers",
            outcome.strategy.as_str(), outcome.elapsed.as_secs_f64(), outcome.workers);
        outcomes.push(outcome);
    }

    let comparison = Comparison { outcomes };
    if !comparison.agree() {
        warn!("Strategies disagree on the best cluster");
    }
    Ok(comparison)
}
