//! File reading helpers

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads input files
pub struct FileReader;

impl FileReader {
    /// Read a whole file as UTF-8 text
    pub fn read_text(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(content)
    }
}
