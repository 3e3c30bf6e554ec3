//! Boundary evaluation against gold segmentations

use crate::{
    cancel::CancelToken,
    error::{EngineError, Result},
    segmenter::Segmenter,
};
use serde::{Deserialize, Serialize};

/// Evaluation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Largest byte distance at which a prediction still matches
    pub tolerance: usize,
    /// Weight of precision in the weighted score
    pub precision_weight: f64,
    /// Weight of recall in the weighted score
    pub recall_weight: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            tolerance: 3,
            precision_weight: 1.0,
            recall_weight: 1.0,
        }
    }
}

/// Boundary detection quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Predictions matching a gold boundary
    pub true_positives: usize,
    /// Predictions matching nothing
    pub false_positives: usize,
    /// Gold boundaries nothing matched
    pub false_negatives: usize,
    /// tp / (tp + fp)
    pub precision: f64,
    /// tp / (tp + fn)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Weighted mean of precision and recall
    pub weighted_score: f64,
}

impl Metrics {
    /// Derive the ratios from raw counts
    pub fn from_counts(tp: usize, fp: usize, fn_: usize, config: &EvalConfig) -> Self {
        let mut m = Metrics {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            ..Default::default()
        };

        if tp + fp > 0 {
            m.precision = tp as f64 / (tp + fp) as f64;
        }
        if tp + fn_ > 0 {
            m.recall = tp as f64 / (tp + fn_) as f64;
        }
        if m.precision + m.recall > 0.0 {
            m.f1 = 2.0 * m.precision * m.recall / (m.precision + m.recall);
        }

        let (wp, wr) = (config.precision_weight, config.recall_weight);
        if wp + wr > 0.0 {
            m.weighted_score = (wp * m.precision + wr * m.recall) / (wp + wr);
        }
        m
    }
}

/// Compare predicted boundary offsets with gold ones
///
/// Predictions are matched greedily left to right, each to the first
/// unmatched gold boundary within the tolerance.
pub fn evaluate(predicted: &[usize], truth: &[usize], config: &EvalConfig) -> Metrics {
    let mut matched = vec![false; truth.len()];
    let mut tp = 0;

    for &p in predicted {
        let hit = truth
            .iter()
            .enumerate()
            .find(|&(i, &t)| !matched[i] && p.abs_diff(t) <= config.tolerance);
        if let Some((i, _)) = hit {
            matched[i] = true;
            tp += 1;
        }
    }

    Metrics::from_counts(tp, predicted.len() - tp, truth.len() - tp, config)
}

/// Largest number of thresholds a single sweep may evaluate
pub const MAX_SWEEP_THRESHOLDS: usize = 10_000;

/// Thresholds from `min` (inclusive) to `max` (exclusive)
///
/// An empty range yields no thresholds. A step that is not a positive
/// finite number, or one that would produce more than
/// [`MAX_SWEEP_THRESHOLDS`] values, is a configuration error.
pub fn sweep_thresholds(min: f32, max: f32, step: f32) -> Result<Vec<f32>> {
    if !min.is_finite() || !max.is_finite() {
        return Err(EngineError::ConfigError(format!(
            "sweep bounds must be finite, got {min}..{max}"
        )));
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(EngineError::ConfigError(format!(
            "sweep step must be positive, got {step}"
        )));
    }
    if min >= max {
        return Ok(Vec::new());
    }

    let count = ((f64::from(max) - f64::from(min)) / f64::from(step)).ceil();
    if count > MAX_SWEEP_THRESHOLDS as f64 {
        return Err(EngineError::ConfigError(format!(
            "sweep {min}..{max} step {step} needs {count} thresholds, limit is {MAX_SWEEP_THRESHOLDS}"
        )));
    }

    Ok((0..count as usize)
        .map(|i| min + step * i as f32)
        .take_while(|&t| t < max)
        .collect())
}

/// A text with its gold boundary offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Name used in reports, usually the file stem
    pub name: String,
    /// Full text
    pub text: String,
    /// Byte offsets where sentences end, excluding the end of the text
    pub boundaries: Vec<usize>,
}

impl Document {
    /// Join gold sentences with single spaces
    pub fn from_sentences<S: AsRef<str>>(sentences: &[S]) -> Self {
        let mut text = String::new();
        let mut boundaries = Vec::new();

        for sentence in sentences {
            let sentence = sentence.as_ref().trim();
            if sentence.is_empty() {
                continue;
            }
            if !text.is_empty() {
                boundaries.push(text.len());
                text.push(' ');
            }
            text.push_str(sentence);
        }

        Self {
            name: String::new(),
            text,
            boundaries,
        }
    }

    /// Document over `text` with gold sentence end offsets
    ///
    /// Offsets past the text are clamped to its length. Offsets that do not
    /// move forward, and those at the very start or end of the text, are
    /// dropped.
    pub fn from_boundaries(name: impl Into<String>, text: impl Into<String>, ends: &[usize]) -> Self {
        let text = text.into();
        let mut boundaries = Vec::with_capacity(ends.len());
        let mut last = 0;
        for &end in ends {
            let end = end.min(text.len());
            if end > last && end < text.len() {
                boundaries.push(end);
                last = end;
            }
        }

        Self {
            name: name.into(),
            text,
            boundaries,
        }
    }

    /// Set the report name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Score one segmenter on this document
    pub fn evaluate(
        &self,
        segmenter: &Segmenter,
        config: &EvalConfig,
        cancel: &CancelToken,
    ) -> Result<Metrics> {
        let (_, predicted) = segmenter.segment_with_boundaries_with_cancel(&self.text, cancel)?;
        Ok(evaluate(&predicted, &self.boundaries, config))
    }
}

/// Metrics for one threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepResult {
    /// Threshold evaluated
    pub threshold: f32,
    /// Metrics pooled over the corpus
    pub metrics: Metrics,
}

/// Evaluate a corpus at every threshold
///
/// Counts are pooled across documents before the ratios are computed.
/// Results come back sorted by weighted score, best first.
pub fn sweep(
    segmenter: &Segmenter,
    documents: &[Document],
    thresholds: &[f32],
    config: &EvalConfig,
    cancel: &CancelToken,
) -> Result<Vec<SweepResult>> {
    let mut results = Vec::with_capacity(thresholds.len());

    for &threshold in thresholds {
        let sibling = segmenter.with_threshold(threshold)?;
        let (mut tp, mut fp, mut fn_) = (0, 0, 0);
        for doc in documents {
            let m = doc.evaluate(&sibling, config, cancel)?;
            tp += m.true_positives;
            fp += m.false_positives;
            fn_ += m.false_negatives;
        }

        let metrics = Metrics::from_counts(tp, fp, fn_, config);
        log::debug!(
            "threshold {threshold:.4}: precision {:.3}, recall {:.3}",
            metrics.precision,
            metrics.recall
        );
        results.push(SweepResult { threshold, metrics });
    }

    results.sort_by(|a, b| {
        b.metrics
            .weighted_score
            .total_cmp(&a.metrics.weighted_score)
    });
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact() -> EvalConfig {
        EvalConfig {
            tolerance: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_perfect_match() {
        let m = evaluate(&[10, 20, 30], &[10, 20, 30], &exact());
        assert_eq!((m.true_positives, m.false_positives, m.false_negatives), (3, 0, 0));
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.weighted_score, 1.0);
    }

    #[test]
    fn test_within_tolerance() {
        let config = EvalConfig {
            tolerance: 2,
            ..Default::default()
        };
        let m = evaluate(&[11, 19, 31], &[10, 20, 30], &config);
        assert_eq!(m.true_positives, 3);
    }

    #[test]
    fn test_false_positive_and_negative() {
        let m = evaluate(&[10, 15, 20], &[10, 20], &exact());
        assert_eq!((m.true_positives, m.false_positives, m.false_negatives), (2, 1, 0));

        let m = evaluate(&[10], &[10, 20], &exact());
        assert_eq!((m.true_positives, m.false_positives, m.false_negatives), (1, 0, 1));
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 0.5);
    }

    #[test]
    fn test_each_gold_boundary_matches_once() {
        let config = EvalConfig {
            tolerance: 5,
            ..Default::default()
        };
        let m = evaluate(&[9, 10, 11], &[10], &config);
        assert_eq!((m.true_positives, m.false_positives), (1, 2));
    }

    #[test]
    fn test_empty_inputs() {
        let m = evaluate(&[], &[], &exact());
        assert_eq!(m, Metrics::default());
    }

    #[test]
    fn test_weighted_score() {
        let config = EvalConfig {
            tolerance: 0,
            precision_weight: 3.0,
            recall_weight: 1.0,
        };
        let m = Metrics::from_counts(1, 0, 1, &config);
        assert_eq!(m.weighted_score, (3.0 * 1.0 + 0.5) / 4.0);
    }

    #[test]
    fn test_sweep_thresholds() {
        let t = sweep_thresholds(0.1, 0.5, 0.1).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t[0], 0.1);
        assert!(t.iter().all(|&x| x < 0.5));

        assert!(sweep_thresholds(0.5, 0.1, 0.1).unwrap().is_empty());
        assert!(sweep_thresholds(0.0, 1.0, 0.0).is_err());
        assert!(sweep_thresholds(0.0, 1.0, f32::NAN).is_err());
        assert!(sweep_thresholds(f32::NEG_INFINITY, 1.0, 0.1).is_err());
    }

    #[test]
    fn test_sweep_thresholds_rejects_tiny_step() {
        let err = sweep_thresholds(0.01, 0.20, 1e-12).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
        assert!(err.to_string().contains("limit is 10000"));

        let many = sweep_thresholds(0.0, 1.0, 1e-3).unwrap();
        assert!((999..=1000).contains(&many.len()));
    }

    #[test]
    fn test_document_from_boundaries() {
        let doc = Document::from_boundaries("ud", "One. Two. Three.", &[4, 4, 9, 2, 16, 40]);
        assert_eq!(doc.name, "ud");
        assert_eq!(doc.boundaries, vec![4, 9]);

        let doc = Document::from_boundaries("x", "Hi.", &[]);
        assert!(doc.boundaries.is_empty());
    }

    #[test]
    fn test_document_from_sentences() {
        let doc = Document::from_sentences(&["Hello world.", "  ", "How are you? "]);
        assert_eq!(doc.text, "Hello world. How are you?");
        assert_eq!(doc.boundaries, vec![12]);
    }
}
