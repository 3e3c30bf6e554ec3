//! Segment command implementation

use super::ModelArgs;
use crate::{
    error::CliError,
    input::{resolve_patterns, FileReader},
    output::{create_formatter, OutputFormat, OutputFormatter, Sink},
    progress::ProgressReporter,
};
use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use std::{fs::File, io::BufWriter, path::PathBuf};

/// Arguments for the segment command
#[derive(Debug, Args)]
pub struct SegmentArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Input files or patterns (supports glob)
    #[arg(short, long, value_name = "FILE/PATTERN")]
    pub input: Vec<String>,

    /// Text to segment directly
    #[arg(long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (default: from the configuration)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// A named text waiting to be segmented
#[derive(Debug)]
struct Source {
    name: String,
    text: String,
}

impl SegmentArgs {
    /// Execute the segment command
    pub fn execute(&self, quiet: bool) -> Result<()> {
        log::debug!("Arguments: {:?}", self);

        let config = self.model.load_config()?;
        let sources = self.collect_sources()?;
        let segmenter = self.model.load_segmenter(&config)?;
        log::info!(
            "Segmenting {} input(s) with {} session(s), threshold {}",
            sources.len(),
            segmenter.pool_capacity(),
            segmenter.threshold()
        );

        let mut progress = ProgressReporter::new(quiet);
        progress.init_files(sources.len() as u64);

        let results: Vec<Result<Vec<String>>> = sources
            .par_iter()
            .map(|source| {
                let segments = segmenter
                    .segment(&source.text)
                    .with_context(|| format!("Failed to segment {}", source.name))?;
                progress.file_completed(&source.name);
                Ok(segments.into_iter().map(str::to_string).collect())
            })
            .collect();
        progress.finish();

        let format = self.format.unwrap_or(config.output.format);
        let mut formatter = create_formatter(format, self.sink()?, config.output.pretty_json);
        for (source, segments) in sources.iter().zip(results) {
            write_document(formatter.as_mut(), &source.name, &segments?)?;
        }
        formatter.finish()?;

        segmenter.close().context("Failed to release scoring sessions")?;
        Ok(())
    }

    fn collect_sources(&self) -> Result<Vec<Source>> {
        if self.input.is_empty() && self.text.is_empty() {
            return Err(
                CliError::MissingInput("pass --input patterns or --text".to_string()).into(),
            );
        }

        let mut sources = Vec::new();
        if !self.input.is_empty() {
            for path in resolve_patterns(&self.input)? {
                sources.push(Source {
                    name: path.display().to_string(),
                    text: FileReader::read_text(&path)?,
                });
            }
        }
        for (i, text) in self.text.iter().enumerate() {
            sources.push(Source {
                name: format!("text {}", i + 1),
                text: text.clone(),
            });
        }
        Ok(sources)
    }

    fn sink(&self) -> Result<Sink> {
        Ok(match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(std::io::stdout()),
        })
    }
}

/// Feed one document's segments to the formatter
///
/// Offsets are cumulative byte positions in the document. Whitespace-only
/// segments advance the offset but are not emitted.
fn write_document(
    formatter: &mut dyn OutputFormatter,
    name: &str,
    segments: &[String],
) -> Result<()> {
    formatter.begin_document(name)?;
    let mut offset = 0;
    for segment in segments {
        if !segment.trim().is_empty() {
            formatter.format_sentence(segment, offset)?;
        }
        offset += segment.len();
    }
    Ok(())
}
