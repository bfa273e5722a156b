// src/knn/builder.rs

use log::trace;
use crate::error::{Error, Result};
use crate::types::{CandidateCluster, PointSet};
use super::distance::{euclidean, DistanceMatrix};
use super::tracker::NeighborTracker;

/// Where a builder reads pairwise distances from.
#[derive(Debug, Clone, Copy)]
pub enum DistanceSource<'a> {
    /// Recompute each pair on demand.
    Direct,
    /// Look pairs up in a prebuilt matrix over the same point set.
    Cached(&'a DistanceMatrix),
}

/// Builds the candidate cluster of one reference point at a time.
///
/// The builder only borrows the point set, and every call to [`build`]
/// allocates its own [`NeighborTracker`], so one builder can be shared by
/// any number of threads.
///
/// [`build`]: ClusterBuilder::build
#[derive(Debug, Clone, Copy)]
pub struct ClusterBuilder<'a> {
    points: &'a PointSet,
    k: usize,
    source: DistanceSource<'a>,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(points: &'a PointSet, k: usize) -> Self {
        Self { points, k, source: DistanceSource::Direct }
    }

    pub fn with_cache(points: &'a PointSet, k: usize, matrix: &'a DistanceMatrix) -> Result<Self> {
        if matrix.len() != points.len() {
            return Err(Error::invalid_state(format!(
                "distance cache covers {} points but the point set has {}",
                matrix.len(), points.len()
            )));
        }
        Ok(Self { points, k, source: DistanceSource::Cached(matrix) })
    }

    #[inline]
    fn distance(&self, i: usize, j: usize) -> f64 {
        match self.source {
            DistanceSource::Direct => euclidean(&self.points[i], &self.points[j]),
            DistanceSource::Cached(matrix) => matrix.get(i, j),
        }
    }

    /// Scan every other point in index order and keep the `k` closest.
    pub fn build(&self, reference: usize) -> Result<CandidateCluster> {
        if reference >= self.points.len() {
            return Err(Error::invalid_state(format!(
                "reference index {} out of bounds for {} points", reference, self.points.len()
            )));
        }

        let mut tracker = NeighborTracker::new(reference, self.k);
        for other in 0..self.points.len() {
            if other == reference {
                continue;
            }
            tracker.observe(other, self.distance(reference, other))?;
        }

        let cluster = tracker.finalize()?;
        trace!("Reference {} -> average {:.6}", reference, cluster.average);
        Ok(cluster)
    }
}

/// Build a single candidate cluster with direct distance evaluation.
pub fn build_cluster(reference: usize, points: &PointSet, k: usize) -> Result<CandidateCluster> {
    ClusterBuilder::new(points, k).build(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> PointSet {
        PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (10.0, 10.0)]).unwrap()
    }

    #[test]
    fn builds_the_documented_example_clusters() {
        let points = line_points();

        let middle = build_cluster(1, &points, 2).unwrap();
        let mut indices: Vec<usize> = middle.neighbors.iter().map(|n| n.index).collect();
        indices.sort();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(middle.average, 1.0);

        let origin = build_cluster(0, &points, 2).unwrap();
        let mut indices: Vec<usize> = origin.neighbors.iter().map(|n| n.index).collect();
        indices.sort();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(origin.sorted_distances(), vec![1.0, 2.0]);
        assert_eq!(origin.average, 1.5);
    }

    #[test]
    fn cached_and_direct_builders_agree() {
        let points = line_points();
        let matrix = DistanceMatrix::build(&points).unwrap();
        let direct = ClusterBuilder::new(&points, 3);
        let cached = ClusterBuilder::with_cache(&points, 3, &matrix).unwrap();

        for reference in 0..points.len() {
            assert_eq!(direct.build(reference).unwrap(), cached.build(reference).unwrap());
        }
    }

    #[test]
    fn repeated_builds_are_identical() {
        let points = line_points();
        let builder = ClusterBuilder::new(&points, 2);
        let first = builder.build(3).unwrap();
        let _other = builder.build(4).unwrap();
        assert_eq!(builder.build(3).unwrap(), first);
    }

    #[test]
    fn all_other_points_when_k_is_n_minus_one() {
        let points = line_points();
        let cluster = build_cluster(4, &points, 4).unwrap();
        let expected: f64 = (0..4).map(|j| euclidean(&points[4], &points[j])).sum::<f64>() / 4.0;
        assert!((cluster.average - expected).abs() < 1e-12);
        assert!(cluster.neighbors.iter().all(|n| n.index != 4));
    }

    #[test]
    fn mismatched_cache_is_rejected() {
        let points = line_points();
        let other = PointSet::from_coords(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        let matrix = DistanceMatrix::build(&other).unwrap();
        assert!(ClusterBuilder::with_cache(&points, 2, &matrix).is_err());
    }

    #[test]
    fn out_of_range_reference_is_rejected() {
        let points = line_points();
        assert!(build_cluster(5, &points, 2).is_err());
    }
}
