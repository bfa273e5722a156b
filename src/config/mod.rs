pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::Result;
use log::{warn, trace};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnnConfig {
    pub input: subsystems::InputConfig,
    pub executor: subsystems::ExecutorConfig,
    pub logging: subsystems::LoggingConfig,
}

impl KnnConfig {
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        self.executor.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let absolute_path = fs::canonicalize(&path)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        trace!("Loading configuration from: {:?}", absolute_path);

        let content = fs::read_to_string(&path)?;
        Self::parse_ini(&content)
    }

    /// Parse INI text. Bad values are warned about and leave the default in
    /// place; the assembled config is validated at the end.
    pub fn parse_ini(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                let handled = match current_section.as_str() {
                    "input" => config.input.from_ini_section(&current_section, key, value),
                    "executor" => config.executor.from_ini_section(&current_section, key, value),
                    "logging" => config.logging.from_ini_section(&current_section, key, value),
                    _ => None,
                };

                match handled {
                    Some(Err(e)) => warn!("Error processing config key {}={}: {}", key, value, e),
                    Some(Ok(())) => {},
                    None => warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section),
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Strategy;
    use crate::knn::{ReductionMode, SplitRule};
    use log::LevelFilter;

    #[test]
    fn parses_every_section() {
        let config = KnnConfig::parse_ini(
            "# benchmark settings\n\
             [input]\n\
             points = 200\n\
             neighbors = 4\n\
             seed = 42\n\
             \n\
             [executor]\n\
             strategy = distributed\n\
             workers = 3\n\
             split_rule = even\n\
             reduction = tree\n\
             distance_cache = never\n\
             \n\
             [logging]\n\
             level = debug\n",
        ).unwrap();

        assert_eq!(config.input.points, Some(200));
        assert_eq!(config.input.neighbors, Some(4));
        assert_eq!(config.input.seed, Some(42));
        assert_eq!(config.executor.strategy.strategies(), vec![Strategy::Distributed]);
        assert_eq!(config.executor.workers, 3);
        assert_eq!(config.executor.split_rule, SplitRule::Even);
        assert_eq!(config.executor.reduction, ReductionMode::Tree);
        assert_eq!(config.logging.get_log_level(), LevelFilter::Debug);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = KnnConfig::parse_ini("[executor]\nsplit_rule = diagonal\n[nowhere]\nx = 1\n").unwrap();
        assert_eq!(config.executor.split_rule, SplitRule::Remainder);
    }
}
