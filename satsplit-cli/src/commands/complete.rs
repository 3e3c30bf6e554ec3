//! Complete command implementation

use super::ModelArgs;
use crate::error::CliError;
use anyhow::{Context, Result};
use clap::Args;

/// Arguments for the complete command
#[derive(Debug, Args)]
pub struct CompleteArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Text to check; several words are joined with spaces
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,
}

impl CompleteArgs {
    /// Execute the complete command
    pub fn execute(&self) -> Result<()> {
        let text = self.text.join(" ");
        if text.trim().is_empty() {
            return Err(CliError::MissingInput("text is empty".to_string()).into());
        }

        let config = self.model.load_config()?;
        let segmenter = self.model.load_segmenter(&config)?;
        let (complete, confidence) = segmenter
            .is_complete(&text)
            .context("Failed to score text")?;

        print!("{}", render(&text, complete, confidence));
        segmenter.close()?;
        Ok(())
    }
}

fn render(text: &str, complete: bool, confidence: f32) -> String {
    format!("Text: {text:?}\nComplete: {complete}\nConfidence: {confidence:.4}\n")
}
