use serde::{Serialize, Deserialize};
use std::cmp::Ordering;
use crate::error::{Error, Result};

/// A point in the plane, identified by its index in a [`PointSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Immutable, ordered collection of points for one computation.
///
/// Construction rejects non-finite coordinates. The lower bound on the number
/// of points is a run parameter and is checked by `knn::validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct PointSet {
    points: Vec<Point>,
}

impl PointSet {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(Error::InvalidCoordinate { index });
        }
        Ok(Self { points })
    }

    pub fn from_coords(coords: &[(f64, f64)]) -> Result<Self> {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }
}

impl TryFrom<Vec<Point>> for PointSet {
    type Error = Error;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PointSet> for Vec<Point> {
    fn from(set: PointSet) -> Self {
        set.points
    }
}

impl std::ops::Index<usize> for PointSet {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

/// One accepted neighbor: the index of the point and its distance to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// A tracker slot. Empty slots are tagged explicitly, since a distance of
/// zero is legitimate for coincident points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NeighborSlot {
    pub neighbor: Option<Neighbor>,
}

impl NeighborSlot {
    pub fn is_empty(&self) -> bool {
        self.neighbor.is_none()
    }

    pub fn distance(&self) -> Option<f64> {
        self.neighbor.map(|n| n.distance)
    }
}

/// A reference point with its k nearest neighbors and their average distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCluster {
    pub reference: usize,
    /// Neighbors in slot order.
    pub neighbors: Vec<Neighbor>,
    pub average: f64,
}

impl CandidateCluster {
    pub fn k(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbor distances sorted ascending, handy for comparing clusters whose
    /// slot order differs.
    pub fn sorted_distances(&self) -> Vec<f64> {
        let mut distances: Vec<f64> = self.neighbors.iter().map(|n| n.distance).collect();
        distances.sort_by(|a, b| a.total_cmp(b));
        distances
    }
}

/// The minimum-average candidate among the reference indices one worker owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub rank: usize,
    pub best: CandidateCluster,
}

impl WorkerResult {
    pub fn best_average(&self) -> f64 {
        self.best.average
    }

    /// Total order used by every reduction: smaller average first, then lower
    /// worker rank, then lower reference index.
    pub fn rank_order(&self, other: &Self) -> Ordering {
        self.best.average
            .total_cmp(&other.best.average)
            .then(self.rank.cmp(&other.rank))
            .then(self.best.reference.cmp(&other.best.reference))
    }
}

/// The winning worker result across all workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalResult {
    pub rank: usize,
    pub best: CandidateCluster,
}

impl GlobalResult {
    pub fn reference(&self) -> usize {
        self.best.reference
    }

    pub fn best_average(&self) -> f64 {
        self.best.average
    }
}

impl From<WorkerResult> for GlobalResult {
    fn from(result: WorkerResult) -> Self {
        Self { rank: result.rank, best: result.best }
    }
}
