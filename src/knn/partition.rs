// src/knn/partition.rs

use std::ops::Range;
use log::debug;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::types::{CandidateCluster, WorkerResult};
use super::builder::ClusterBuilder;
use super::validate::check_workers;

/// How reference indices are divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitRule {
    /// Equal ranges; requires N divisible by the worker count.
    Even,
    /// The first `N mod W` workers take one extra index each.
    Remainder,
}

impl SplitRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitRule::Even => "even",
            SplitRule::Remainder => "remainder",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').trim().to_lowercase().as_str() {
            "even" => Some(Self::Even),
            "remainder" => Some(Self::Remainder),
            _ => None,
        }
    }
}

impl Default for SplitRule {
    fn default() -> Self {
        Self::Remainder
    }
}

/// A worker's contiguous, half-open slice of reference indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub rank: usize,
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    n: usize,
    workers: usize,
}

impl Partitioner {
    pub fn new(n: usize, workers: usize, rule: SplitRule) -> Result<Self> {
        check_workers(workers, n)?;
        if rule == SplitRule::Even && n % workers != 0 {
            return Err(Error::InvalidPartition {
                workers,
                n,
                reason: "even split requires the point count to be divisible by the worker count".to_string(),
            });
        }
        Ok(Self { n, workers })
    }

    /// The range owned by `rank`, computed without materializing the others.
    pub fn range_for(&self, rank: usize) -> Result<IndexRange> {
        if rank >= self.workers {
            return Err(Error::invalid_state(format!(
                "rank {} outside a group of {} workers", rank, self.workers
            )));
        }
        let base = self.n / self.workers;
        let extra = self.n % self.workers;
        let start = rank * base + rank.min(extra);
        let len = base + usize::from(rank < extra);
        Ok(IndexRange { rank, start, end: start + len })
    }

    pub fn ranges(&self) -> Vec<IndexRange> {
        let base = self.n / self.workers;
        let extra = self.n % self.workers;
        let mut start = 0;
        (0..self.workers)
            .map(|rank| {
                let len = base + usize::from(rank < extra);
                let range = IndexRange { rank, start, end: start + len };
                start += len;
                range
            })
            .collect()
    }
}

/// Build the cluster of every reference index in `range` and keep the one
/// with the smallest average. On equal averages the lower index wins.
pub fn scan_range(builder: &ClusterBuilder<'_>, range: IndexRange) -> Result<WorkerResult> {
    let mut best: Option<CandidateCluster> = None;

    for reference in range.indices() {
        let cluster = builder.build(reference)?;
        let improves = match &best {
            Some(current) => cluster.average < current.average,
            None => true,
        };
        if improves {
            best = Some(cluster);
        }
    }

    let best = best.ok_or_else(|| Error::invalid_state(format!(
        "worker {} was assigned an empty range", range.rank
    )))?;
    debug!("Worker {} scanned {}..{}, best reference {} with average {:.6}",
        range.rank, range.start, range.end, best.reference, best.average);

    Ok(WorkerResult { rank: range.rank, best })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PointSet;

    fn covered(ranges: &[IndexRange], n: usize) -> bool {
        let mut next = 0;
        for range in ranges {
            if range.start != next || range.is_empty() {
                return false;
            }
            next = range.end;
        }
        next == n
    }

    #[test]
    fn even_split_gives_equal_ranges() {
        let ranges = Partitioner::new(12, 4, SplitRule::Even).unwrap().ranges();
        assert!(ranges.iter().all(|r| r.len() == 3));
        assert!(covered(&ranges, 12));
    }

    #[test]
    fn even_split_rejects_indivisible_counts() {
        let err = Partitioner::new(10, 4, SplitRule::Even).unwrap_err();
        assert!(matches!(err, Error::InvalidPartition { workers: 4, n: 10, .. }));
    }

    #[test]
    fn remainder_split_front_loads_the_extra_indices() {
        let ranges = Partitioner::new(10, 4, SplitRule::Remainder).unwrap().ranges();
        let lens: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert!(covered(&ranges, 10));
    }

    #[test]
    fn range_for_matches_ranges() {
        let partitioner = Partitioner::new(23, 6, SplitRule::Remainder).unwrap();
        for range in partitioner.ranges() {
            assert_eq!(partitioner.range_for(range.rank).unwrap(), range);
        }
        assert!(partitioner.range_for(6).is_err());
    }

    #[test]
    fn one_worker_per_point() {
        let ranges = Partitioner::new(5, 5, SplitRule::Remainder).unwrap().ranges();
        assert!(ranges.iter().all(|r| r.len() == 1));
        assert!(covered(&ranges, 5));
    }

    #[test]
    fn scan_range_keeps_the_lowest_index_on_ties() {
        // A square: every corner has the same two nearest neighbors.
        let points = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (50.0, 50.0)]).unwrap();
        let builder = ClusterBuilder::new(&points, 2);
        let result = scan_range(&builder, IndexRange { rank: 0, start: 0, end: 4 }).unwrap();
        assert_eq!(result.best.reference, 0);
        assert_eq!(result.best_average(), 1.0);

        let later = scan_range(&builder, IndexRange { rank: 1, start: 2, end: 5 }).unwrap();
        assert_eq!(later.best.reference, 2);
        assert_eq!(later.rank, 1);
    }

    #[test]
    fn split_rule_parses_config_values() {
        assert_eq!(SplitRule::from_str("\"Even\""), Some(SplitRule::Even));
        assert_eq!(SplitRule::from_str("remainder"), Some(SplitRule::Remainder));
        assert_eq!(SplitRule::from_str("modulo"), None);
    }
}
