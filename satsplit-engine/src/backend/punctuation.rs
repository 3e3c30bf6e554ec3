//! Deterministic punctuation backend
//!
//! Scores a token as a sentence end when its piece ends in a terminator,
//! optionally followed by closing quotes or brackets. Useful as a baseline
//! and wherever no model is available.

use super::{Scorer, ScorerFactory, Session};
use crate::{cancel::CancelToken, error::Result};
use satsplit_tokenizer::{remap, Tokenizer};

/// Characters that end a sentence
pub const TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？', '…'];

/// Characters allowed after a terminator
const CLOSERS: &[char] = &['"', '\'', ')', ']', '”', '’', '」', '』', '）'];

/// Punctuation-driven [`Scorer`]
#[derive(Debug, Clone)]
pub struct PunctuationScorer {
    tokenizer: Tokenizer,
    boundary_logit: f32,
    other_logit: f32,
}

impl PunctuationScorer {
    /// Default logit for terminator tokens
    pub const BOUNDARY_LOGIT: f32 = 6.0;
    /// Default logit for every other token
    pub const OTHER_LOGIT: f32 = -6.0;

    /// Scorer resolving IDs through `tokenizer`'s vocabulary
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            boundary_logit: Self::BOUNDARY_LOGIT,
            other_logit: Self::OTHER_LOGIT,
        }
    }

    /// Override the emitted logits
    pub fn with_logits(mut self, boundary: f32, other: f32) -> Self {
        self.boundary_logit = boundary;
        self.other_logit = other;
        self
    }

    fn is_terminal(&self, id: i64) -> bool {
        let Some(entry) = u32::try_from(id)
            .ok()
            .and_then(remap::to_internal)
            .and_then(|index| self.tokenizer.vocabulary().entry(index))
        else {
            return false;
        };
        entry
            .piece
            .trim_end_matches(CLOSERS)
            .ends_with(TERMINATORS)
    }
}

impl Scorer for PunctuationScorer {
    fn score(&mut self, ids: &[i64], mask: &[i64], cancel: &CancelToken) -> Result<Vec<f32>> {
        cancel.check()?;
        Ok(ids
            .iter()
            .zip(mask)
            .map(|(&id, &m)| {
                if m != 0 && self.is_terminal(id) {
                    self.boundary_logit
                } else {
                    self.other_logit
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "punctuation"
    }
}

impl ScorerFactory for PunctuationScorer {
    fn create(&self) -> Result<Session> {
        Ok(Box::new(self.clone()))
    }
}
