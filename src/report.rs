use std::fmt;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::exec::RunOutcome;
use crate::types::{CandidateCluster, Neighbor, Point, PointSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborReport {
    pub point: Point,
    pub distance: f64,
}

fn lookup(points: &PointSet, index: usize) -> Result<Point> {
    points.get(index).copied().ok_or_else(|| {
        Error::invalid_state(format!("result names point {} outside a set of {}", index, points.len()))
    })
}

fn resolve_neighbors(neighbors: &[Neighbor], points: &PointSet) -> Result<Vec<NeighborReport>> {
    neighbors
        .iter()
        .map(|n| Ok(NeighborReport { point: lookup(points, n.index)?, distance: n.distance }))
        .collect()
}

/// Plain-value view of a run's result for the result consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub strategy: String,
    pub workers: usize,
    pub reference_index: usize,
    pub reference: Point,
    pub neighbors: Vec<NeighborReport>,
    pub average: f64,
    pub elapsed_secs: f64,
}

impl ClusterReport {
    /// Resolve the indices in `outcome` against the point set they came from.
    pub fn from_outcome(outcome: &RunOutcome, points: &PointSet) -> Result<Self> {
        let best = &outcome.result.best;
        Ok(Self {
            strategy: outcome.strategy.as_str().to_string(),
            workers: outcome.workers,
            reference_index: best.reference,
            reference: lookup(points, best.reference)?,
            neighbors: resolve_neighbors(&best.neighbors, points)?,
            average: best.average,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ClusterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Smallest average distance: {:.6}", self.average)?;
        writeln!(f, "Reference point #{}: ({}, {})", self.reference_index, self.reference.x, self.reference.y)?;
        writeln!(f, "{} nearest neighbors:", self.neighbors.len())?;
        for neighbor in &self.neighbors {
            writeln!(f, "  ({}, {})  distance {:.6}", neighbor.point.x, neighbor.point.y, neighbor.distance)?;
        }
        write!(f, "Compute time ({}, {} workers): {:.6}s", self.strategy, self.workers, self.elapsed_secs)
    }
}

/// One row of the full candidate listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub position: usize,
    pub reference_index: usize,
    pub reference: Point,
    pub neighbors: Vec<NeighborReport>,
    pub average: f64,
}

impl CandidateReport {
    /// Resolve an already ranked listing, keeping its order.
    pub fn listing(ranked: &[CandidateCluster], points: &PointSet) -> Result<Vec<Self>> {
        ranked
            .iter()
            .enumerate()
            .map(|(position, cluster)| {
                Ok(Self {
                    position,
                    reference_index: cluster.reference,
                    reference: lookup(points, cluster.reference)?,
                    neighbors: resolve_neighbors(&cluster.neighbors, points)?,
                    average: cluster.average,
                })
            })
            .collect()
    }
}

impl fmt::Display for CandidateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] P#{} ({}, {}) average {:.6}:",
            self.position, self.reference_index, self.reference.x, self.reference.y, self.average)?;
        for neighbor in &self.neighbors {
            write!(f, " ({}, {})", neighbor.point.x, neighbor.point.y)?;
        }
        Ok(())
    }
}

/// Everything the binary prints for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<ClusterReport>,
    pub agree: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<Vec<CandidateReport>>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::exec::Strategy;
    use crate::types::{CandidateCluster, GlobalResult, Neighbor};

    fn outcome() -> (RunOutcome, PointSet) {
        let points = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]).unwrap();
        let best = CandidateCluster {
            reference: 1,
            neighbors: vec![Neighbor { index: 0, distance: 1.0 }, Neighbor { index: 2, distance: 1.0 }],
            average: 1.0,
        };
        let outcome = RunOutcome {
            strategy: Strategy::Serial,
            workers: 1,
            result: GlobalResult { rank: 0, best },
            elapsed: Duration::from_millis(5),
            collectives: 0,
        };
        (outcome, points)
    }

    #[test]
    fn resolves_coordinates() {
        let (outcome, points) = outcome();
        let report = ClusterReport::from_outcome(&outcome, &points).unwrap();
        assert_eq!(report.reference, Point::new(1.0, 0.0));
        assert_eq!(report.neighbors[1].point, Point::new(2.0, 0.0));
        assert_eq!(report.strategy, "serial");

        let text = report.to_string();
        assert!(text.starts_with("Smallest average distance: 1.000000"));
        assert!(text.contains("Reference point #1: (1, 0)"));
    }

    #[test]
    fn json_contains_the_average() {
        let (outcome, points) = outcome();
        let json = ClusterReport::from_outcome(&outcome, &points).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["average"], 1.0);
        assert_eq!(value["reference_index"], 1);
    }

    #[test]
    fn listing_keeps_rank_order() {
        let points = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (10.0, 10.0)]).unwrap();
        let ranked = crate::knn::rank_clusters(&points, 2).unwrap();
        let listing = CandidateReport::listing(&ranked, &points).unwrap();

        assert_eq!(listing.len(), 5);
        assert_eq!(listing[0].position, 0);
        assert_eq!(listing[0].reference, Point::new(1.0, 0.0));
        assert_eq!(listing[4].reference_index, 4);
        assert!(listing[0].to_string().starts_with("[0] P#1 (1, 0) average 1.000000:"));
    }

    #[test]
    fn run_report_omits_the_listing_unless_requested() {
        let (outcome, points) = outcome();
        let report = RunReport {
            results: vec![ClusterReport::from_outcome(&outcome, &points).unwrap()],
            agree: true,
            clusters: None,
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("clusters").is_none());
        assert_eq!(value["results"][0]["reference_index"], 1);
        assert_eq!(value["agree"], true);
    }

    #[test]
    fn unknown_indices_are_rejected() {
        let (outcome, _) = outcome();
        let small = PointSet::from_coords(&[(0.0, 0.0), (1.0, 0.0)]).unwrap();
        assert!(ClusterReport::from_outcome(&outcome, &small).is_err());
    }
}
