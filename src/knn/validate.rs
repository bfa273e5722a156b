// src/knn/validate.rs

use crate::error::{Error, Result};

/// Smallest point set the benchmark accepts unless configured otherwise.
pub const DEFAULT_MIN_POINTS: usize = 5;

/// Smallest neighborhood that makes an average meaningful.
pub const MIN_NEIGHBORS: usize = 2;

pub fn check_point_count(n: usize, minimum: usize) -> Result<()> {
    if n < minimum {
        return Err(Error::InvalidPointCount { found: n, minimum });
    }
    Ok(())
}

pub fn check_neighbor_count(k: usize, n: usize) -> Result<()> {
    if k < MIN_NEIGHBORS || k >= n {
        return Err(Error::InvalidNeighborCount { k, n });
    }
    Ok(())
}

pub fn check_workers(workers: usize, n: usize) -> Result<()> {
    if workers == 0 {
        return Err(Error::InvalidPartition {
            workers, n, reason: "at least one worker is required".to_string(),
        });
    }
    if workers > n {
        return Err(Error::InvalidPartition {
            workers, n, reason: "more workers than reference points leaves some ranges empty".to_string(),
        });
    }
    Ok(())
}

/// Pre-flight check for a run. Pure function of its arguments, so every
/// worker handed the same parameters reaches the same verdict.
pub fn validate_run(n: usize, k: usize, workers: usize, min_points: usize) -> Result<()> {
    check_point_count(n, min_points)?;
    check_neighbor_count(k, n)?;
    check_workers(workers, n)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_boundaries() {
        assert!(validate_run(5, 2, 1, DEFAULT_MIN_POINTS).is_ok());
        assert!(validate_run(5, 4, 5, DEFAULT_MIN_POINTS).is_ok());
    }

    #[test]
    fn rejects_too_few_points() {
        let err = validate_run(4, 2, 1, DEFAULT_MIN_POINTS).unwrap_err();
        assert!(matches!(err, Error::InvalidPointCount { found: 4, minimum: 5 }));
    }

    #[test]
    fn rejects_k_outside_two_to_n() {
        assert!(matches!(validate_run(6, 1, 1, 5), Err(Error::InvalidNeighborCount { k: 1, n: 6 })));
        assert!(matches!(validate_run(6, 6, 1, 5), Err(Error::InvalidNeighborCount { k: 6, n: 6 })));
    }

    #[test]
    fn rejects_bad_worker_counts() {
        assert!(matches!(validate_run(6, 2, 0, 5), Err(Error::InvalidPartition { workers: 0, .. })));
        assert!(matches!(validate_run(6, 2, 7, 5), Err(Error::InvalidPartition { workers: 7, .. })));
    }

    #[test]
    fn point_count_is_checked_first() {
        // Both N and k are bad; N is reported.
        assert!(matches!(validate_run(2, 9, 9, 5), Err(Error::InvalidPointCount { .. })));
    }
}
