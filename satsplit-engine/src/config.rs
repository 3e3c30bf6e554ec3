//! Configuration types for the engine

use crate::{
    chunker::ChunkPolicy,
    error::{EngineError, Result},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration values
pub mod defaults {
    /// Boundary probability threshold
    pub const THRESHOLD: f32 = 0.025;
    /// Longest token sequence submitted to a backend in one call
    pub const MAX_SEQ_LEN: usize = 512;
    /// Tokens shared by consecutive windows
    pub const OVERLAP: usize = 64;
}

/// Segmenter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Probability above which a token ends a sentence
    pub threshold: f32,
    /// Number of pooled sessions (None = one per CPU)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,
    /// Window width in tokens
    pub max_seq_len: usize,
    /// Overlap between consecutive windows in tokens
    pub overlap: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::THRESHOLD,
            pool_size: None,
            max_seq_len: defaults::MAX_SEQ_LEN,
            overlap: defaults::OVERLAP,
        }
    }
}

impl SegmenterConfig {
    /// Create a builder starting from the defaults
    pub fn builder() -> SegmenterConfigBuilder {
        SegmenterConfigBuilder::new()
    }

    /// Pool size actually used, resolving auto-detection
    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Chunking policy derived from this configuration
    pub fn chunk_policy(&self) -> Result<ChunkPolicy> {
        ChunkPolicy::new(self.max_seq_len, self.overlap)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(EngineError::ConfigError(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        if self.pool_size == Some(0) {
            return Err(EngineError::ConfigError(
                "pool size must be greater than 0".to_string(),
            ));
        }

        self.chunk_policy().map(|_| ())
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::IoError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Builder for [`SegmenterConfig`]
#[derive(Debug, Clone, Default)]
pub struct SegmenterConfigBuilder {
    config: SegmenterConfig,
}

impl SegmenterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the boundary threshold
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the pool size (None = one per CPU)
    pub fn pool_size(mut self, size: Option<usize>) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set the window width
    pub fn max_seq_len(mut self, len: usize) -> Self {
        self.config.max_seq_len = len;
        self
    }

    /// Set the window overlap
    pub fn overlap(mut self, overlap: usize) -> Self {
        self.config.overlap = overlap;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<SegmenterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
