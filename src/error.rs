use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid point count: {found} points, at least {minimum} required")]
    InvalidPointCount { found: usize, minimum: usize },

    #[error("Invalid neighbor count: k = {k} must satisfy 2 <= k < {n}")]
    InvalidNeighborCount { k: usize, n: usize },

    #[error("Invalid partition of {n} points over {workers} workers: {reason}")]
    InvalidPartition { workers: usize, n: usize, reason: String },

    #[error("Point {index} has a non-finite coordinate")]
    InvalidCoordinate { index: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }

    pub fn communication<S: Into<String>>(msg: S) -> Self {
        Error::Communication(msg.into())
    }

    /// True for the input-bound violations that are rejected before any
    /// distance is computed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidPointCount { .. }
                | Error::InvalidNeighborCount { .. }
                | Error::InvalidPartition { .. }
                | Error::InvalidCoordinate { .. }
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(format!("Thread pool build failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_classified() {
        assert!(Error::InvalidPointCount { found: 3, minimum: 5 }.is_validation());
        assert!(Error::InvalidNeighborCount { k: 1, n: 5 }.is_validation());
        assert!(!Error::invalid_state("tracker not full").is_validation());
        assert!(!Error::communication("closed").is_validation());
    }

    #[test]
    fn messages_name_the_bounds() {
        let err = Error::InvalidNeighborCount { k: 7, n: 5 };
        assert_eq!(err.to_string(), "Invalid neighbor count: k = 7 must satisfy 2 <= k < 5");
    }
}
