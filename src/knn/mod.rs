//! Brute-force nearest-neighbor search and best-cluster reduction.
//!
//! Every strategy in [`crate::exec`] is assembled from these pieces: validate
//! the run, split the reference indices, scan each range with a
//! [`ClusterBuilder`], then reduce the per-worker minima.

pub mod distance;
pub mod tracker;
pub mod builder;
pub mod partition;
pub mod reduce;
pub mod ranking;
pub mod validate;

pub use self::distance::{euclidean, DistanceMatrix};
pub use self::tracker::NeighborTracker;
pub use self::builder::{build_cluster, ClusterBuilder, DistanceSource};
pub use self::partition::{scan_range, IndexRange, Partitioner, SplitRule};
pub use self::reduce::{Reducer, ReductionMode};
pub use self::ranking::{cluster_order, rank_clusters};
pub use self::validate::{validate_run, DEFAULT_MIN_POINTS};
