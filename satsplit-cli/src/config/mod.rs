//! Configuration module

use crate::{error::CliError, output::OutputFormat};
use anyhow::{Context, Result};
use satsplit_engine::{EvalConfig, SegmenterConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// CLI configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Segmenter configuration
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Evaluation configuration
    #[serde(default)]
    pub evaluation: EvalConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig {
                pool_size: Some(num_cpus::get()),
                ..SegmenterConfig::default()
            },
            output: OutputConfig::default(),
            evaluation: EvalConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| CliError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config
            .segmenter
            .validate()
            .map_err(|e| CliError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Render as commented TOML
    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        Ok(format!("# satsplit configuration\n\n{body}"))
    }
}

/// Output-related configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: OutputFormat,

    /// Pretty print JSON output
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            pretty_json: true,
        }
    }
}
