// src/knn/ranking.rs

use std::cmp::Ordering;
use log::debug;
use rayon::prelude::*;
use crate::error::Result;
use crate::types::{CandidateCluster, PointSet};
use super::builder::ClusterBuilder;
use super::validate::check_neighbor_count;

/// Order candidates by average distance, then by reference index.
pub fn cluster_order(a: &CandidateCluster, b: &CandidateCluster) -> Ordering {
    a.average
        .total_cmp(&b.average)
        .then(a.reference.cmp(&b.reference))
}

/// Build the candidate cluster of every point and sort them, most compact
/// first. The head of the listing is the cluster every strategy reports.
pub fn rank_clusters(points: &PointSet, k: usize) -> Result<Vec<CandidateCluster>> {
    check_neighbor_count(k, points.len())?;

    let builder = ClusterBuilder::new(points, k);
    let mut clusters = (0..points.len())
        .into_par_iter()
        .map(|reference| builder.build(reference))
        .collect::<Result<Vec<_>>>()?;
    clusters.sort_by(cluster_order);

    debug!("Ranked {} candidate clusters of {} neighbors", clusters.len(), k);
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn ranks_the_documented_example() {
        let points = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (10.0, 10.0)]).unwrap();
        let ranking = rank_clusters(&points, 2).unwrap();

        let order: Vec<usize> = ranking.iter().map(|c| c.reference).collect();
        // (1,0) and (2,0) both average 1.0; the lower index comes first.
        assert_eq!(order, vec![1, 2, 0, 3, 4]);
        assert_eq!(ranking[0].average, 1.0);
        assert_eq!(ranking[2].average, 1.5);
        assert!(ranking.windows(2).all(|w| w[0].average <= w[1].average));
    }

    #[test]
    fn every_point_appears_once() {
        let points = PointSet::from_coords(&[
            (4.0, 4.0), (4.0, 4.0), (7.0, 1.0), (2.0, 9.0), (6.0, 6.0), (0.0, 3.0),
        ]).unwrap();
        let mut references: Vec<usize> = rank_clusters(&points, 3).unwrap().iter().map(|c| c.reference).collect();
        references.sort();
        assert_eq!(references, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn invalid_k_is_rejected() {
        let points = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]).unwrap();
        assert!(matches!(rank_clusters(&points, 3), Err(Error::InvalidNeighborCount { k: 3, n: 3 })));
    }
}
