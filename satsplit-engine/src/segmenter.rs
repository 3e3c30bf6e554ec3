//! Sentence segmenter and builder
//!
//! A [`Segmenter`] ties a tokenizer to a pool of scoring sessions. Each call
//! normalizes and tokenizes the text, borrows one session for every window
//! of the sequence, returns it, and turns the averaged logits into split
//! points in the original text.

use crate::{
    backend::{Scorer, ScorerFactory, Session},
    cancel::CancelToken,
    chunker::{accumulate_windows, ChunkPolicy, LogitAccumulator},
    config::{SegmenterConfig, SegmenterConfigBuilder},
    error::{EngineError, Result, Stage},
    pool::ResourcePool,
};
use satsplit_tokenizer::{Token, TokenId, Tokenizer};
use std::fmt;
use std::sync::Arc;

/// Sentence boundary detector over a pluggable scoring backend
///
/// Cheap to clone; clones and [`with_threshold`](Self::with_threshold)
/// siblings share the tokenizer and the session pool.
#[derive(Clone)]
pub struct Segmenter {
    tokenizer: Tokenizer,
    pool: Arc<ResourcePool<Session>>,
    policy: ChunkPolicy,
    config: SegmenterConfig,
}

impl fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segmenter")
            .field("config", &self.config)
            .field("pool_capacity", &self.pool.capacity())
            .field("vocab_size", &self.tokenizer.vocab_size())
            .finish()
    }
}

/// Logistic function, computed in f64
fn sigmoid(logit: f32) -> f32 {
    (1.0 / (1.0 + (-f64::from(logit)).exp())) as f32
}

impl Segmenter {
    /// Create a segmenter, building every pooled session up front
    pub fn new(
        tokenizer: Tokenizer,
        factory: &dyn ScorerFactory,
        config: SegmenterConfig,
    ) -> Result<Self> {
        config.validate()?;
        let policy = config.chunk_policy()?;
        let pool = ResourcePool::new(config.effective_pool_size(), |_| factory.create())?;

        log::debug!(
            "segmenter ready: threshold {}, {} sessions, windows of {} tokens",
            config.threshold,
            pool.capacity(),
            policy.max_seq_len()
        );

        Ok(Self {
            tokenizer,
            pool: Arc::new(pool),
            policy,
            config,
        })
    }

    /// Create a builder
    pub fn builder() -> SegmenterBuilder {
        SegmenterBuilder::new()
    }

    /// Sibling segmenter with a different threshold
    ///
    /// Shares this segmenter's tokenizer and pool, so closing either closes
    /// both.
    pub fn with_threshold(&self, threshold: f32) -> Result<Self> {
        let config = SegmenterConfig {
            threshold,
            ..self.config.clone()
        };
        config.validate()?;
        Ok(Self {
            config,
            ..self.clone()
        })
    }

    /// Boundary probability threshold
    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    /// Active configuration
    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Underlying tokenizer
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Number of pooled sessions
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Tokenize `text`
    pub fn encode(&self, text: &str) -> Vec<Token> {
        self.tokenizer.encode(text)
    }

    /// Reconstruct text from token IDs
    pub fn decode(&self, ids: &[TokenId]) -> String {
        self.tokenizer.decode(ids)
    }

    /// Tokens of `text` with their boundary probabilities
    ///
    /// Text without tokens returns immediately without touching the pool.
    pub fn token_probabilities(
        &self,
        text: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<(Token, f32)>> {
        let tokens = self.tokenizer.encode(text);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let logits = self.score(&tokens, cancel)?;
        Ok(tokens
            .into_iter()
            .zip(logits)
            .map(|(token, logit)| (token, sigmoid(logit)))
            .collect())
    }

    fn score(&self, tokens: &[Token], cancel: &CancelToken) -> Result<Vec<f32>> {
        let ids: Vec<i64> = tokens.iter().map(|t| i64::from(t.id)).collect();
        Ok(self.score_unaveraged(&ids, cancel)?.finalize())
    }

    /// Run every window through one pooled session
    ///
    /// The session is back in the pool when this returns, so averaging the
    /// logits never holds it.
    fn score_unaveraged(&self, ids: &[i64], cancel: &CancelToken) -> Result<LogitAccumulator> {
        let mut session = self
            .pool
            .acquire(cancel)
            .map_err(|e| e.in_stage(Stage::Acquire))?;

        let mut windows = 0;
        let acc = accumulate_windows(ids, &self.policy, |_, ids, mask| {
            windows += 1;
            cancel.check().map_err(|e| e.in_stage(Stage::Score))?;
            session
                .score(ids, mask, cancel)
                .map_err(|e| e.in_stage(Stage::Score))
        })
        .map_err(|e| e.in_stage(Stage::Aggregate))?;
        let backend = session.name();
        drop(session);

        log::debug!(
            "scored {} tokens in {} windows with {}",
            ids.len(),
            windows,
            backend
        );
        Ok(acc)
    }

    /// Whether `text` ends a sentence, and the final token's probability
    pub fn is_complete(&self, text: &str) -> Result<(bool, f32)> {
        self.is_complete_with_cancel(text, &CancelToken::new())
    }

    /// [`is_complete`](Self::is_complete) with cancellation
    pub fn is_complete_with_cancel(
        &self,
        text: &str,
        cancel: &CancelToken,
    ) -> Result<(bool, f32)> {
        match self.token_probabilities(text, cancel)?.last() {
            Some(&(_, prob)) => Ok((prob > self.config.threshold, prob)),
            None => Ok((false, 0.0)),
        }
    }

    /// Split `text` into sentences
    pub fn segment<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        self.segment_with_cancel(text, &CancelToken::new())
    }

    /// [`segment`](Self::segment) with cancellation
    pub fn segment_with_cancel<'t>(
        &self,
        text: &'t str,
        cancel: &CancelToken,
    ) -> Result<Vec<&'t str>> {
        Ok(self.segment_with_boundaries_with_cancel(text, cancel)?.0)
    }

    /// Split `text` into sentences, also returning the split byte offsets
    pub fn segment_with_boundaries<'t>(&self, text: &'t str) -> Result<(Vec<&'t str>, Vec<usize>)> {
        self.segment_with_boundaries_with_cancel(text, &CancelToken::new())
    }

    /// [`segment_with_boundaries`](Self::segment_with_boundaries) with
    /// cancellation
    pub fn segment_with_boundaries_with_cancel<'t>(
        &self,
        text: &'t str,
        cancel: &CancelToken,
    ) -> Result<(Vec<&'t str>, Vec<usize>)> {
        let scored = self.token_probabilities(text, cancel)?;
        if scored.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let ends = scored
            .iter()
            .filter(|(_, prob)| *prob > self.config.threshold)
            .map(|(token, _)| token.source_end);
        Ok(split_at(text, ends))
    }

    /// Segment many texts concurrently; concurrency is bounded by the pool
    #[cfg(feature = "parallel")]
    pub fn segment_batch<'t>(&self, texts: &[&'t str]) -> Result<Vec<Vec<&'t str>>> {
        self.segment_batch_with_cancel(texts, &CancelToken::new())
    }

    /// [`segment_batch`](Self::segment_batch) with cancellation
    #[cfg(feature = "parallel")]
    pub fn segment_batch_with_cancel<'t>(
        &self,
        texts: &[&'t str],
        cancel: &CancelToken,
    ) -> Result<Vec<Vec<&'t str>>> {
        use rayon::prelude::*;

        texts
            .par_iter()
            .map(|&text| self.segment_with_cancel(text, cancel))
            .collect()
    }

    /// Close the session pool; later calls fail with
    /// [`EngineError::PoolClosed`]
    pub fn close(&self) -> Result<()> {
        self.pool.close()
    }
}

/// Cut `text` at ascending byte offsets strictly inside it
fn split_at(text: &str, ends: impl Iterator<Item = usize>) -> (Vec<&str>, Vec<usize>) {
    let mut segments = Vec::new();
    let mut splits = Vec::new();
    let mut start = 0;

    for end in ends {
        if end > start && end < text.len() {
            segments.push(&text[start..end]);
            splits.push(end);
            start = end;
        }
    }
    if start < text.len() {
        segments.push(&text[start..]);
    }
    (segments, splits)
}

/// Builder for [`Segmenter`]
#[derive(Debug, Default)]
pub struct SegmenterBuilder {
    tokenizer: Option<Tokenizer>,
    config_builder: SegmenterConfigBuilder,
}

impl SegmenterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tokenizer (required)
    pub fn tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: SegmenterConfig) -> Self {
        self.config_builder = SegmenterConfigBuilder::new()
            .threshold(config.threshold)
            .pool_size(config.pool_size)
            .max_seq_len(config.max_seq_len)
            .overlap(config.overlap);
        self
    }

    /// Set the boundary threshold
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config_builder = self.config_builder.threshold(threshold);
        self
    }

    /// Set the pool size (None = one per CPU)
    pub fn pool_size(mut self, size: Option<usize>) -> Self {
        self.config_builder = self.config_builder.pool_size(size);
        self
    }

    /// Set the window width
    pub fn max_seq_len(mut self, len: usize) -> Self {
        self.config_builder = self.config_builder.max_seq_len(len);
        self
    }

    /// Set the window overlap
    pub fn overlap(mut self, overlap: usize) -> Self {
        self.config_builder = self.config_builder.overlap(overlap);
        self
    }

    /// Build the segmenter with sessions from `factory`
    pub fn build(self, factory: &dyn ScorerFactory) -> Result<Segmenter> {
        let tokenizer = self
            .tokenizer
            .ok_or_else(|| EngineError::ConfigError("a tokenizer is required".to_string()))?;
        let config = self.config_builder.build()?;
        Segmenter::new(tokenizer, factory, config)
    }
}
