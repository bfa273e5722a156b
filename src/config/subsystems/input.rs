// src/config/subsystems/input.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::FromIni;
use crate::knn::DEFAULT_MIN_POINTS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    // Run size; prompted for when absent
    pub points: Option<usize>,
    pub neighbors: Option<usize>,

    pub min_points: usize,

    // Generated coordinates are integers in [1, max_coordinate]
    pub max_coordinate: u32,
    pub seed: Option<u64>,

    // Read points from CSV instead of generating them
    pub points_file: Option<PathBuf>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            points: None,
            neighbors: None,
            min_points: DEFAULT_MIN_POINTS,
            max_coordinate: 1000,
            seed: None,
            points_file: None,
        }
    }
}

impl FromIni for InputConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "input" {
            return None;
        }

        match key {
            "points" => {
                match value.parse() {
                    Ok(n) => {
                        self.points = Some(n);
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid points: {}", value)
                    ))),
                }
            },
            "neighbors" => {
                match value.parse() {
                    Ok(k) => {
                        self.neighbors = Some(k);
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid neighbors: {}", value)
                    ))),
                }
            },
            "min_points" => {
                match value.parse() {
                    Ok(min) if min >= 3 => {
                        self.min_points = min;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid min_points (must be >= 3): {}", value)
                    ))),
                }
            },
            "max_coordinate" => {
                match value.parse() {
                    Ok(max) if max >= 1 => {
                        self.max_coordinate = max;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid max_coordinate (must be >= 1): {}", value)
                    ))),
                }
            },
            "seed" => {
                match value.parse() {
                    Ok(seed) => {
                        self.seed = Some(seed);
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid seed: {}", value)
                    ))),
                }
            },
            "points_file" => {
                let path = value.trim_matches('"');
                self.points_file = if path.is_empty() { None } else { Some(PathBuf::from(path)) };
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl InputConfig {
    pub fn validate(&self) -> Result<()> {
        // A run needs 2 <= k < N, so N >= 3 at the very least
        if self.min_points < 3 {
            return Err(Error::Config(
                "min_points must be at least 3".to_string()
            ));
        }
        if self.max_coordinate == 0 {
            return Err(Error::Config(
                "max_coordinate must be greater than 0".to_string()
            ));
        }
        if let Some(path) = &self.points_file {
            if !path.exists() {
                return Err(Error::Config(
                    format!("Points file does not exist: {:?}", path)
                ));
            }
        }
        Ok(())
    }
}
