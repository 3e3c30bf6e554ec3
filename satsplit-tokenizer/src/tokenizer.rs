//! Unigram tokenizer producing model-ready token IDs

use crate::normalize::{normalize, WORD_BOUNDARY};
use crate::remap::{self, TokenId, BOS_ID, EOS_ID, PAD_ID, UNK_ID};
use crate::unigram::best_path;
use crate::vocab::{PieceType, Vocabulary};
use std::sync::Arc;

/// A token with its position in both the normalized and the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// External (model) token ID
    pub id: TokenId,
    /// Piece text as it appears in the normalized text
    pub piece: String,
    /// Start byte offset in the normalized text
    pub start: usize,
    /// End byte offset in the normalized text
    pub end: usize,
    /// Start byte offset in the source text
    pub source_start: usize,
    /// End byte offset in the source text
    pub source_end: usize,
}

/// SentencePiece-compatible Unigram tokenizer
///
/// Stateless after construction; clones share the same vocabulary and
/// every method may be called concurrently.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Arc<Vocabulary>,
}

impl Tokenizer {
    /// Create a tokenizer owning `vocab`
    pub fn new(vocab: Vocabulary) -> Self {
        Self {
            vocab: Arc::new(vocab),
        }
    }

    /// The underlying vocabulary
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Tokenize `text`
    ///
    /// Tokens are contiguous and together cover the whole normalized text.
    /// Empty or all-whitespace input yields no tokens.
    pub fn encode(&self, text: &str) -> Vec<Token> {
        if text.is_empty() {
            return Vec::new();
        }
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        best_path(&self.vocab, &normalized)
            .into_iter()
            .map(|p| Token {
                id: remap::to_external(p.index),
                piece: normalized.slice(p.start, p.end).to_string(),
                start: normalized.byte_offset(p.start),
                end: normalized.byte_offset(p.end),
                source_start: normalized.source_offset(p.start),
                source_end: normalized.source_offset(p.end),
            })
            .collect()
    }

    /// Tokenize `text`, returning only the IDs
    pub fn encode_ids(&self, text: &str) -> Vec<TokenId> {
        self.encode(text).into_iter().map(|t| t.id).collect()
    }

    /// Reconstruct text from token IDs
    ///
    /// Padding, out-of-range and control IDs are skipped without error.
    pub fn decode(&self, ids: &[TokenId]) -> String {
        let mut out = String::new();
        for &id in ids {
            let Some(entry) = remap::to_internal(id).and_then(|i| self.vocab.entry(i)) else {
                continue;
            };
            if entry.kind == PieceType::Control {
                continue;
            }
            out.push_str(&entry.piece);
        }

        let out = out.replace(WORD_BOUNDARY, " ");
        match out.strip_prefix(' ') {
            Some(rest) => rest.to_string(),
            None => out,
        }
    }

    /// Size of the external ID space, including the padding slot
    pub fn vocab_size(&self) -> usize {
        self.vocab.len() + 1
    }

    /// Begin-of-sequence ID
    pub fn bos_id(&self) -> TokenId {
        BOS_ID
    }

    /// Padding ID
    pub fn pad_id(&self) -> TokenId {
        PAD_ID
    }

    /// End-of-sequence ID
    pub fn eos_id(&self) -> TokenId {
        EOS_ID
    }

    /// Unknown-piece ID
    pub fn unk_id(&self) -> TokenId {
        UNK_ID
    }
}
