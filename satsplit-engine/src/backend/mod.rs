//! Scoring backends
//!
//! A backend turns one window of token IDs into one logit per token. The
//! engine only sees the [`Scorer`] trait; how logits are computed is up to
//! the implementation.

use crate::{cancel::CancelToken, error::Result, pool::Resource};

pub mod half;
pub mod punctuation;
pub mod runtime;

pub use half::{HalfKernel, HalfPrecisionScorer};
pub use punctuation::PunctuationScorer;
pub use runtime::{RuntimeEnvironment, RuntimeScorerFactory};

/// One reusable backend execution handle
pub trait Scorer: Send {
    /// Score one window; returns exactly one logit per input token
    ///
    /// `mask` has the same length as `ids` and is 1 for real tokens.
    fn score(&mut self, ids: &[i64], mask: &[i64], cancel: &CancelToken) -> Result<Vec<f32>>;

    /// Release backend resources; called once before the session is dropped
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}

/// Pooled scoring session
pub type Session = Box<dyn Scorer>;

impl Resource for Session {
    fn destroy(mut self) -> Result<()> {
        self.close()
    }
}

/// Creates scoring sessions
pub trait ScorerFactory: Send + Sync {
    /// Build a new session
    fn create(&self) -> Result<Session>;
}

impl<F> ScorerFactory for F
where
    F: Fn() -> Result<Session> + Send + Sync,
{
    fn create(&self) -> Result<Session> {
        self()
    }
}
