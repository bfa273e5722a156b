// src/exec/distributed.rs

use std::time::{Duration, Instant};
use log::{debug, info};
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::knn::{scan_range, validate_run, ClusterBuilder, Partitioner, Reducer, SplitRule};
use crate::types::{GlobalResult, PointSet, WorkerResult};
use super::comm::{Communicator, World};
use super::{Executor, RunOutcome, Strategy};

/// Run parameters as the coordinator encodes them.
#[derive(Serialize)]
struct BroadcastRef<'a> {
    n: usize,
    k: usize,
    points: &'a PointSet,
}

/// Run parameters as each rank decodes them.
#[derive(Deserialize)]
struct Broadcast {
    n: usize,
    k: usize,
    points: PointSet,
}

/// Distributed-memory model: one rank per process, with no shared state.
///
/// The coordinator broadcasts N, k and the points once; every rank scans
/// its own range; one gather brings the local bests back for reduction.
#[derive(Debug, Clone)]
pub struct DistributedExecutor {
    processes: usize,
    min_points: usize,
    split_rule: SplitRule,
}

impl DistributedExecutor {
    pub fn new(processes: usize, min_points: usize) -> Self {
        Self { processes, min_points, split_rule: SplitRule::default() }
    }

    pub fn with_split_rule(mut self, split_rule: SplitRule) -> Self {
        self.split_rule = split_rule;
        self
    }
}

/// Body run by every rank. Only the coordinator passes `input`, and only the
/// coordinator gets a result back.
fn rank_main(
    comm: Communicator,
    input: Option<(&PointSet, usize)>,
    split_rule: SplitRule,
) -> Result<Option<(GlobalResult, Duration)>> {
    let payload = match input {
        Some((points, k)) => Some(bincode::serialize(&BroadcastRef { n: points.len(), k, points })?),
        None => None,
    };
    let bytes = comm.broadcast(payload)?;
    let params: Broadcast = bincode::deserialize(&bytes)?;
    if params.points.len() != params.n {
        return Err(Error::invalid_state(format!(
            "rank {} received {} points but N = {}", comm.rank(), params.points.len(), params.n
        )));
    }

    let start = Instant::now();
    let range = Partitioner::new(params.n, comm.size(), split_rule)?.range_for(comm.rank())?;
    let builder = ClusterBuilder::new(&params.points, params.k);
    let local = scan_range(&builder, range)?;
    debug!("Rank {} finished {}..{}", comm.rank(), range.start, range.end);

    let gathered = comm.gather(bincode::serialize(&local)?)?;
    match gathered {
        None => Ok(None),
        Some(blobs) => {
            let results = blobs
                .iter()
                .map(|blob| bincode::deserialize::<WorkerResult>(blob).map_err(Error::from))
                .collect::<Result<Vec<_>>>()?;
            let global = Reducer::reduce_sequential(results)?;
            Ok(Some((global, start.elapsed())))
        },
    }
}

impl Executor for DistributedExecutor {
    fn strategy(&self) -> Strategy {
        Strategy::Distributed
    }

    fn validate(&self, n: usize, k: usize) -> Result<()> {
        validate_run(n, k, self.processes, self.min_points)?;
        Partitioner::new(n, self.processes, self.split_rule)?;
        Ok(())
    }

    fn execute(&self, points: &PointSet, k: usize) -> Result<RunOutcome> {
        let n = points.len();
        // Checked before any rank exists, so no rank can be left waiting on a
        // collective.
        self.validate(n, k)?;
        info!("Distributed run: N = {}, k = {}, {} processes, {} split",
            n, k, self.processes, self.split_rule.as_str());

        let (comms, stats) = World::create(self.processes)?;
        let split_rule = self.split_rule;

        let outcome = crossbeam_utils::thread::scope(|s| -> Result<Option<(GlobalResult, Duration)>> {
            let mut comms = comms.into_iter();
            let root = comms
                .next()
                .ok_or_else(|| Error::communication("world has no coordinator"))?;

            let handles: Vec<_> = comms
                .map(|comm| s.spawn(move |_| rank_main(comm, None, split_rule)))
                .collect();

            let root_outcome = rank_main(root, Some((points, k)), split_rule);

            let mut worker_error = None;
            for (offset, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(Ok(_)) => {},
                    Ok(Err(e)) => {
                        worker_error.get_or_insert(e);
                    },
                    Err(_) => {
                        worker_error.get_or_insert(Error::communication(format!("rank {} panicked", offset + 1)));
                    },
                }
            }

            // The coordinator's own failure explains the workers' disconnects.
            let root_outcome = root_outcome?;
            match worker_error {
                Some(e) => Err(e),
                None => Ok(root_outcome),
            }
        })
        .map_err(|_| Error::communication("a rank panicked"))??;

        let (result, elapsed) = outcome
            .ok_or_else(|| Error::invalid_state("coordinator produced no result"))?;

        Ok(RunOutcome {
            strategy: Strategy::Distributed,
            workers: self.processes,
            result,
            elapsed,
            collectives: stats.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knn::DEFAULT_MIN_POINTS;

    fn example() -> PointSet {
        PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (10.0, 10.0)]).unwrap()
    }

    #[test]
    fn exactly_two_collectives_per_run() {
        for processes in 1..=5 {
            let outcome = DistributedExecutor::new(processes, DEFAULT_MIN_POINTS)
                .execute(&example(), 2)
                .unwrap();
            assert_eq!(outcome.collectives, 2);
            assert_eq!(outcome.result.reference(), 1);
            assert_eq!(outcome.result.best_average(), 1.0);
        }
    }

    #[test]
    fn invalid_input_never_spawns_ranks() {
        let err = DistributedExecutor::new(3, DEFAULT_MIN_POINTS).execute(&example(), 9).unwrap_err();
        assert!(matches!(err, Error::InvalidNeighborCount { k: 9, n: 5 }));

        let err = DistributedExecutor::new(2, DEFAULT_MIN_POINTS)
            .with_split_rule(SplitRule::Even)
            .execute(&example(), 2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPartition { .. }));
    }
}
