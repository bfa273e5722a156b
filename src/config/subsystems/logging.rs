// src/config/subsystems/logging.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        "none" => Some(LevelFilter::Off),
        _ => None,
    }
}

impl FromIni for LoggingConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "logging" {
            return None;
        }

        match key {
            "level" => {
                let level = value.trim_matches('"').trim().to_lowercase();
                Some(match parse_level(&level) {
                    Some(_) => {
                        self.level = level;
                        Ok(())
                    },
                    None => Err(Error::Config(
                        format!("Invalid log level '{}'. Must be one of: none, error, warn, info, debug, trace", value)
                    )),
                })
            },
            "log_to_file" => {
                match value.parse() {
                    Ok(flag) => {
                        self.log_to_file = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid log_to_file value (must be true/false): {}", value)
                    ))),
                }
            },
            "log_dir" => {
                self.log_dir = PathBuf::from(value.trim_matches('"'));
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl LoggingConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        parse_level(&self.level).unwrap_or(LevelFilter::Info)
    }

    pub fn validate(&self) -> Result<()> {
        if parse_level(&self.level).is_none() {
            return Err(Error::Config(format!("Invalid log level: {}", self.level)));
        }
        Ok(())
    }
}
