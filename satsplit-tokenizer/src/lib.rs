//! Unigram subword tokenizer for satsplit
//!
//! This crate holds the deterministic half of the segmenter: the piece
//! table, whitespace normalization, Viterbi segmentation and the mapping
//! between vocabulary indices and the token IDs a scoring model expects.
//! Nothing here performs I/O beyond the optional JSON vocabulary loader.
//!
//! # Example
//!
//! ```rust
//! use satsplit_tokenizer::{PieceType, Tokenizer, Vocabulary, VocabularyEntry};
//!
//! let vocab = Vocabulary::from_entries(vec![
//!     VocabularyEntry::new("<unk>", 0.0, PieceType::Unknown),
//!     VocabularyEntry::new("<s>", 0.0, PieceType::Control),
//!     VocabularyEntry::new("</s>", 0.0, PieceType::Control),
//!     VocabularyEntry::normal("▁Hi", -1.0),
//!     VocabularyEntry::normal("!", -1.0),
//! ])
//! .unwrap();
//!
//! let tokenizer = Tokenizer::new(vocab);
//! let tokens = tokenizer.encode("Hi!");
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokenizer.decode(&tokenizer.encode_ids("Hi!")), "Hi!");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod normalize;
pub mod remap;
pub mod tokenizer;
mod unigram;
pub mod vocab;

pub use error::{Result, VocabularyError};
pub use normalize::{normalize, Normalized, WORD_BOUNDARY};
pub use remap::{TokenId, BOS_ID, EOS_ID, PAD_ID, UNK_ID};
pub use tokenizer::{Token, Tokenizer};
pub use vocab::{Markers, PieceType, Vocabulary, VocabularyEntry};
