//! Sentence segmentation over a pluggable scoring backend
//!
//! This crate turns tokenizer output into sentence boundaries: it splits
//! long token sequences into overlapping windows, gates backend sessions
//! through a bounded pool, averages per-window logits and thresholds the
//! resulting probabilities.
//!
//! # Example
//!
//! ```rust
//! use satsplit_engine::{PunctuationScorer, Segmenter};
//! use satsplit_tokenizer::{PieceType, Tokenizer, Vocabulary, VocabularyEntry};
//!
//! let vocab = Vocabulary::from_entries(vec![
//!     VocabularyEntry::new("<unk>", -10.0, PieceType::Unknown),
//!     VocabularyEntry::new("<s>", 0.0, PieceType::Control),
//!     VocabularyEntry::new("</s>", 0.0, PieceType::Control),
//!     VocabularyEntry::normal("▁Hi", -1.0),
//!     VocabularyEntry::normal(".", -1.0),
//! ])
//! .unwrap();
//! let tokenizer = Tokenizer::new(vocab);
//!
//! let segmenter = Segmenter::builder()
//!     .tokenizer(tokenizer.clone())
//!     .pool_size(Some(1))
//!     .build(&PunctuationScorer::new(tokenizer))
//!     .unwrap();
//!
//! assert_eq!(segmenter.segment("Hi. Hi.").unwrap(), vec!["Hi.", " Hi."]);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod cancel;
pub mod chunker;
pub mod config;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod pool;
pub mod segmenter;

// Re-export key types
pub use backend::{
    HalfKernel, HalfPrecisionScorer, PunctuationScorer, RuntimeEnvironment, RuntimeScorerFactory,
    Scorer, ScorerFactory, Session,
};
pub use cancel::{CancelToken, WakerGuard};
pub use chunker::{ChunkPolicy, ChunkWindow, LogitAccumulator};
pub use config::{SegmenterConfig, SegmenterConfigBuilder};
pub use corpus::{parse_header, CorpusLoader, GoldFormat, TranscriptHeader};
pub use error::{BackendError, EngineError, Result, Stage};
pub use eval::{
    evaluate, sweep, sweep_thresholds, Document, EvalConfig, Metrics, SweepResult,
    MAX_SWEEP_THRESHOLDS,
};
pub use pool::{Pooled, Resource, ResourcePool};
pub use segmenter::{Segmenter, SegmenterBuilder};

// Re-export from the tokenizer for convenience
pub use satsplit_tokenizer::{Token, TokenId, Tokenizer, Vocabulary};
