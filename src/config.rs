// File: src/config.rs
//
// Run configuration for the benchmark driver.
// Loaded from an optional TOML file and then overridden by CLI flags.

use crate::benchmarks::reporter::OutputOptions;
use crate::errors::{BenchError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of samples per variant (setup runs once per sample)
    pub repeats: usize,
    /// Statement executions timed together as one sample
    pub iterations: usize,
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    /// Open each chart in the platform image viewer
    pub show: bool,
    /// Print horizontal bars in the terminal after each report
    pub terminal_chart: bool,
    /// Only run test cases whose name matches this regex
    pub only: Option<String>,
    /// Write all reports as JSON here after the run
    pub json_output: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            repeats: 5,
            iterations: 10,
            data_path: PathBuf::from("data.csv"),
            output_dir: PathBuf::from("images"),
            show: false,
            terminal_chart: true,
            only: None,
            json_output: None,
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BenchError::from(e).with_context(path.display().to_string()))?;
        Self::from_toml_str(&text).map_err(|e| e.with_context(path.display().to_string()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BenchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.repeats == 0 {
            return Err(BenchError::config("repeats must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(BenchError::config("iterations must be at least 1"));
        }
        self.selector()?;
        Ok(())
    }

    /// Compiled `only` filter, if any
    pub fn selector(&self) -> Result<Option<Regex>> {
        Ok(match &self.only {
            Some(pattern) => Some(Regex::new(pattern)?),
            None => None,
        })
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            output_dir: self.output_dir.clone(),
            terminal_chart: self.terminal_chart,
            show: self.show,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.repeats, 5);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.output_dir, PathBuf::from("images"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BenchConfig::from_toml_str("repeats = 3\nonly = \"column\"\n").unwrap();
        assert_eq!(config.repeats, 3);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.only.as_deref(), Some("column"));
    }

    #[test]
    fn test_zero_repeats_rejected() {
        let err = BenchConfig::from_toml_str("repeats = 0").unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::Config);
    }

    #[test]
    fn test_bad_filter_rejected() {
        let config = BenchConfig { only: Some("(".to_string()), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(BenchConfig::from_toml_str("iterations = \"ten\"").is_err());
    }
}
