// src/knn/reduce.rs

use std::cmp::Ordering;
use log::debug;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::types::{GlobalResult, WorkerResult};

/// How worker results are combined after the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReductionMode {
    Sequential,
    Tree,
}

impl ReductionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReductionMode::Sequential => "sequential",
            ReductionMode::Tree => "tree",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').trim().to_lowercase().as_str() {
            "sequential" | "serial" => Some(Self::Sequential),
            "tree" | "parallel" => Some(Self::Tree),
            _ => None,
        }
    }
}

impl Default for ReductionMode {
    fn default() -> Self {
        Self::Sequential
    }
}

/// Keeps whichever result sorts first under [`WorkerResult::rank_order`].
/// Associative and commutative, so any reduction tree gives the same winner.
fn better(a: WorkerResult, b: WorkerResult) -> WorkerResult {
    match b.rank_order(&a) {
        Ordering::Less => b,
        _ => a,
    }
}

pub struct Reducer;

impl Reducer {
    pub fn reduce(results: Vec<WorkerResult>, mode: ReductionMode) -> Result<GlobalResult> {
        match mode {
            ReductionMode::Sequential => Self::reduce_sequential(results),
            ReductionMode::Tree => Self::reduce_tree(results),
        }
    }

    pub fn reduce_sequential(results: Vec<WorkerResult>) -> Result<GlobalResult> {
        let count = results.len();
        let winner = results
            .into_iter()
            .reduce(better)
            .ok_or_else(|| Error::invalid_state("no worker results to reduce"))?;

        debug!("Reduced {} worker results: rank {} wins with reference {} (average {:.6})",
            count, winner.rank, winner.best.reference, winner.best.average);
        Ok(winner.into())
    }

    /// Pairwise reduction on the current rayon pool.
    pub fn reduce_tree(results: Vec<WorkerResult>) -> Result<GlobalResult> {
        let count = results.len();
        let winner = results
            .into_par_iter()
            .reduce_with(better)
            .ok_or_else(|| Error::invalid_state("no worker results to reduce"))?;

        debug!("Tree-reduced {} worker results: rank {} wins with reference {} (average {:.6})",
            count, winner.rank, winner.best.reference, winner.best.average);
        Ok(winner.into())
    }
}
