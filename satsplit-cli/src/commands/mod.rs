//! CLI command implementations

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use satsplit_engine::{PunctuationScorer, Segmenter};
use satsplit_tokenizer::{Tokenizer, Vocabulary};
use std::path::PathBuf;

pub mod complete;
pub mod encode;
pub mod evaluate;
pub mod generate_config;
pub mod segment;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split text into sentences
    Segment(segment::SegmentArgs),

    /// Check whether text ends a complete sentence
    Complete(complete::CompleteArgs),

    /// Show the tokens of a text
    Encode(encode::EncodeArgs),

    /// Score segmentation against a gold file
    Evaluate(evaluate::EvaluateArgs),

    /// Write a default configuration file
    GenerateConfig(generate_config::GenerateConfigArgs),
}

impl Commands {
    /// Run the selected command
    pub fn execute(&self, quiet: bool) -> Result<()> {
        match self {
            Commands::Segment(args) => args.execute(quiet),
            Commands::Complete(args) => args.execute(),
            Commands::Encode(args) => args.execute(),
            Commands::Evaluate(args) => args.execute(quiet),
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}

/// Vocabulary and segmenter options shared by several commands
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Vocabulary file (JSON)
    #[arg(long, value_name = "FILE", env = "SATSPLIT_VOCAB")]
    pub vocab: PathBuf,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Boundary probability threshold (overrides the configuration)
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Number of scoring sessions (overrides the configuration)
    #[arg(long, value_name = "N")]
    pub pool_size: Option<usize>,
}

impl ModelArgs {
    /// Configuration file merged with command-line overrides
    pub fn load_config(&self) -> Result<CliConfig> {
        let mut config = match &self.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.segmenter.threshold = threshold;
        }
        if let Some(size) = self.pool_size {
            config.segmenter.pool_size = Some(size);
        }
        Ok(config)
    }

    /// Tokenizer over the vocabulary file
    pub fn load_tokenizer(&self) -> Result<Tokenizer> {
        let vocab = Vocabulary::from_file(&self.vocab)
            .with_context(|| format!("Failed to load vocabulary: {}", self.vocab.display()))?;
        log::info!(
            "Loaded vocabulary with {} pieces from {}",
            vocab.len(),
            self.vocab.display()
        );
        Ok(Tokenizer::new(vocab))
    }

    /// Segmenter using the punctuation backend
    pub fn load_segmenter(&self, config: &CliConfig) -> Result<Segmenter> {
        let tokenizer = self.load_tokenizer()?;
        let scorer = PunctuationScorer::new(tokenizer.clone());
        Segmenter::new(tokenizer, &scorer, config.segmenter.clone())
            .context("Failed to create segmenter")
    }
}
