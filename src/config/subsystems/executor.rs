// src/config/subsystems/executor.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;
use crate::exec::{CachePolicy, Strategy};
use crate::knn::{ReductionMode, SplitRule};

/// Which strategies a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyChoice {
    One(Strategy),
    /// Every strategy on the same input, compared afterwards.
    All,
}

impl StrategyChoice {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').trim().to_lowercase().as_str() {
            "all" | "compare" => Some(Self::All),
            other => Strategy::from_str(other).map(Self::One),
        }
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        match self {
            StrategyChoice::One(strategy) => vec![*strategy],
            StrategyChoice::All => Strategy::ALL.to_vec(),
        }
    }
}

impl Default for StrategyChoice {
    fn default() -> Self {
        Self::One(Strategy::SharedMemory)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheMode {
    Never,
    Always,
    Auto,
}

impl CacheMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_matches('"').trim().to_lowercase().as_str() {
            "never" | "off" => Some(Self::Never),
            "always" | "on" => Some(Self::Always),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub strategy: StrategyChoice,

    // Threads or processes; 0 means one per CPU
    pub workers: usize,

    pub split_rule: SplitRule,
    pub reduction: ReductionMode,

    // Serial distance matrix
    pub distance_cache: CacheMode,
    pub max_cache_mb: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyChoice::default(),
            workers: 0,
            split_rule: SplitRule::Remainder,
            reduction: ReductionMode::Sequential,
            distance_cache: CacheMode::Auto,
            max_cache_mb: 512,
        }
    }
}

impl FromIni for ExecutorConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "executor" {
            return None;
        }

        match key {
            "strategy" => {
                match StrategyChoice::from_str(value) {
                    Some(choice) => {
                        self.strategy = choice;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid strategy (serial, shared, distributed or all): {}", value)
                    ))),
                }
            },
            "workers" => {
                match value.parse() {
                    Ok(workers) => {
                        self.workers = workers;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid workers: {}", value)
                    ))),
                }
            },
            "split_rule" => {
                match SplitRule::from_str(value) {
                    Some(rule) => {
                        self.split_rule = rule;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid split_rule (even or remainder): {}", value)
                    ))),
                }
            },
            "reduction" => {
                match ReductionMode::from_str(value) {
                    Some(mode) => {
                        self.reduction = mode;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid reduction (sequential or tree): {}", value)
                    ))),
                }
            },
            "distance_cache" => {
                match CacheMode::from_str(value) {
                    Some(mode) => {
                        self.distance_cache = mode;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid distance_cache (never, always or auto): {}", value)
                    ))),
                }
            },
            "max_cache_mb" => {
                match value.parse() {
                    Ok(mb) => {
                        self.max_cache_mb = mb;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid max_cache_mb: {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.distance_cache == CacheMode::Auto && self.max_cache_mb == 0 {
            log::warn!("max_cache_mb is 0; the serial strategy will not cache distances");
        }
        Ok(())
    }

    /// Effective worker count for `n` points. An explicit count is returned
    /// unchanged so that run validation can reject it; the automatic count
    /// never exceeds `n`.
    pub fn worker_count(&self, n: usize) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            num_cpus::get().min(n).max(1)
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self.distance_cache {
            CacheMode::Never => CachePolicy::Never,
            CacheMode::Always => CachePolicy::Always,
            CacheMode::Auto => CachePolicy::Auto {
                max_bytes: self.max_cache_mb.saturating_mul(1024 * 1024),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_choice_accepts_all_and_single_names() {
        assert_eq!(StrategyChoice::from_str("all"), Some(StrategyChoice::All));
        assert_eq!(StrategyChoice::from_str("Serial"), Some(StrategyChoice::One(Strategy::Serial)));
        assert_eq!(StrategyChoice::All.strategies().len(), 3);
        assert_eq!(StrategyChoice::from_str("gpu"), None);
    }

    #[test]
    fn automatic_worker_count_fits_the_input() {
        let config = ExecutorConfig::default();
        assert!(config.worker_count(1) == 1);
        assert!(config.worker_count(1000) >= 1);

        let explicit = ExecutorConfig { workers: 9, ..ExecutorConfig::default() };
        assert_eq!(explicit.worker_count(5), 9);
    }

    #[test]
    fn cache_policy_converts_megabytes() {
        let config = ExecutorConfig { max_cache_mb: 2, ..ExecutorConfig::default() };
        assert_eq!(config.cache_policy(), CachePolicy::Auto { max_bytes: 2 * 1024 * 1024 });
    }
}
