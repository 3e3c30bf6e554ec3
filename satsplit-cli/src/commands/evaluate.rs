//! Evaluate command implementation

use super::ModelArgs;
use crate::{error::CliError, input::resolve_patterns, progress::ProgressReporter};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use satsplit_engine::{
    sweep, sweep_thresholds, CancelToken, CorpusLoader, Document, GoldFormat, Metrics,
    SweepResult,
};
use std::path::Path;

/// Layout of the gold files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GoldFormatArg {
    /// Decide per file from its extension and header
    #[default]
    Auto,
    /// One sentence per line
    Lines,
    /// JSON with text and boundary offsets
    Json,
    /// Transcript with a `# Source:` header
    Transcript,
}

impl GoldFormatArg {
    fn format(self) -> Option<GoldFormat> {
        match self {
            GoldFormatArg::Auto => None,
            GoldFormatArg::Lines => Some(GoldFormat::Lines),
            GoldFormatArg::Json => Some(GoldFormat::Json),
            GoldFormatArg::Transcript => Some(GoldFormat::Transcript),
        }
    }
}

/// Arguments for the evaluate command
#[derive(Debug, Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Gold files, patterns (supports glob) or corpus directories
    #[arg(short, long, value_name = "PATH", required = true)]
    pub input: Vec<String>,

    /// Gold file layout
    #[arg(long, value_enum, default_value_t = GoldFormatArg::Auto)]
    pub gold_format: GoldFormatArg,

    /// Largest byte distance for a boundary match (overrides the configuration)
    #[arg(long)]
    pub tolerance: Option<usize>,

    /// Evaluate a range of thresholds instead of a single one
    #[arg(long)]
    pub sweep: bool,

    /// First threshold of the sweep
    #[arg(long, default_value_t = 0.01)]
    pub sweep_min: f32,

    /// End of the sweep (exclusive)
    #[arg(long, default_value_t = 0.20)]
    pub sweep_max: f32,

    /// Sweep step
    #[arg(long, default_value_t = 0.01)]
    pub sweep_step: f32,

    /// Number of sweep results to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

impl EvaluateArgs {
    /// Execute the evaluate command
    pub fn execute(&self, quiet: bool) -> Result<()> {
        let mut config = self.model.load_config()?;
        if let Some(tolerance) = self.tolerance {
            config.evaluation.tolerance = tolerance;
        }

        let documents = self.load_documents()?;
        let segmenter = self.model.load_segmenter(&config)?;
        let cancel = CancelToken::new();

        if self.sweep {
            let thresholds = sweep_thresholds(self.sweep_min, self.sweep_max, self.sweep_step)
                .context("Invalid sweep range")?;
            if thresholds.is_empty() {
                return Err(CliError::ConfigError(format!(
                    "empty sweep range {}..{} step {}",
                    self.sweep_min, self.sweep_max, self.sweep_step
                ))
                .into());
            }
            log::info!(
                "Sweeping {} thresholds over {} documents",
                thresholds.len(),
                documents.len()
            );

            let results = sweep(
                &segmenter,
                &documents,
                &thresholds,
                &config.evaluation,
                &cancel,
            )
            .context("Threshold sweep failed")?;
            print!("{}", sweep_table(&results, self.top));
        } else {
            let mut progress = ProgressReporter::new(quiet);
            progress.init_files(documents.len() as u64);

            let (mut tp, mut fp, mut fn_) = (0, 0, 0);
            for doc in &documents {
                let m = doc
                    .evaluate(&segmenter, &config.evaluation, &cancel)
                    .with_context(|| format!("Failed to evaluate {}", doc.name))?;
                log::info!(
                    "{}: precision {:.4}, recall {:.4}, f1 {:.4}",
                    doc.name,
                    m.precision,
                    m.recall,
                    m.f1
                );
                tp += m.true_positives;
                fp += m.false_positives;
                fn_ += m.false_negatives;
                progress.file_completed(&doc.name);
            }
            progress.finish();

            let metrics = Metrics::from_counts(tp, fp, fn_, &config.evaluation);
            print!("{}", metrics_report(segmenter.threshold(), &metrics));
        }

        segmenter.close()?;
        Ok(())
    }

    /// Gold documents from every input, directories expanded in path order
    fn load_documents(&self) -> Result<Vec<Document>> {
        let loader = CorpusLoader::new()?;
        let format = self.gold_format.format();
        let mut documents = Vec::new();

        for input in &self.input {
            let path = Path::new(input);
            if path.is_dir() {
                let loaded = loader
                    .load_dir(path)
                    .with_context(|| format!("Failed to load corpus: {input}"))?;
                if loaded.is_empty() {
                    return Err(
                        CliError::MissingInput(format!("{input} has no gold files")).into(),
                    );
                }
                documents.extend(loaded);
                continue;
            }
            for file in resolve_patterns(std::slice::from_ref(input))? {
                let doc = loader
                    .load_file(&file, format)
                    .with_context(|| format!("Failed to load gold file: {}", file.display()))?;
                documents.push(doc);
            }
        }

        log::info!("Loaded {} gold documents", documents.len());
        Ok(documents)
    }
}

fn metrics_report(threshold: f32, m: &Metrics) -> String {
    format!(
        "Threshold: {threshold:.4}\n\
         True positives: {}\n\
         False positives: {}\n\
         False negatives: {}\n\
         Precision: {:.4}\n\
         Recall: {:.4}\n\
         F1: {:.4}\n",
        m.true_positives, m.false_positives, m.false_negatives, m.precision, m.recall, m.f1
    )
}

fn sweep_table(results: &[SweepResult], top: usize) -> String {
    let mut out = format!(
        "{:>9}  {:>9}  {:>9}  {:>9}  {:>9}\n",
        "threshold", "precision", "recall", "f1", "score"
    );
    for r in results.iter().take(top) {
        out.push_str(&format!(
            "{:>9.4}  {:>9.4}  {:>9.4}  {:>9.4}  {:>9.4}\n",
            r.threshold,
            r.metrics.precision,
            r.metrics.recall,
            r.metrics.f1,
            r.metrics.weighted_score
        ));
    }
    out
}
