//! knn-compact finds, among N points in the plane, the point whose k nearest
//! neighbors lie closest to it on average. The same brute-force search runs
//! serially, on a shared-memory thread pool, or across message-passing ranks,
//! and every strategy returns the same answer.

// Module declarations
pub mod error;
pub mod types;
pub mod knn;
pub mod exec;
pub mod config;
pub mod input;
pub mod report;

// Re-exports
pub use error::{Error, Result};
pub use types::{CandidateCluster, GlobalResult, Neighbor, NeighborSlot, Point, PointSet, WorkerResult};
pub use knn::{ClusterBuilder, NeighborTracker, Partitioner, Reducer};
pub use exec::{Executor, RunOutcome, Strategy};
pub use report::{CandidateReport, ClusterReport, RunReport};

// Re-export the config from config module
pub use config::KnnConfig;
