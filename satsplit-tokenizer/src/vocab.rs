//! Immutable piece table for the Unigram model
//!
//! The table is loaded once and shared read-only between every encoder.
//! Internal indices follow the SentencePiece load order: the unknown piece
//! sits at index 0, the begin/end control pieces at 1 and 2.

use crate::error::{Result, VocabularyError};
use std::collections::HashMap;

/// Internal index of the unknown piece
pub const UNKNOWN_INDEX: usize = 0;
/// Internal index of the begin-of-sequence control piece
pub const BEGIN_INDEX: usize = 1;
/// Internal index of the end-of-sequence control piece
pub const END_INDEX: usize = 2;

/// Kind of a vocabulary piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PieceType {
    /// Ordinary subword piece
    #[default]
    Normal,
    /// The unknown-piece placeholder
    Unknown,
    /// Control symbol such as `<s>`; never matched against text
    Control,
    /// User-defined piece, matched like a normal one
    UserDefined,
    /// Byte-fallback piece, matched like a normal one
    Byte,
    /// Reserved piece that is never emitted
    Unused,
}

impl PieceType {
    /// Whether pieces of this type may be matched against input text
    pub fn is_matchable(self) -> bool {
        matches!(
            self,
            PieceType::Normal | PieceType::UserDefined | PieceType::Byte
        )
    }
}

/// A single `(piece, score, type)` triple
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VocabularyEntry {
    /// Piece text, using `▁` for word boundaries
    pub piece: String,
    /// Log-probability of the piece
    pub score: f32,
    /// Piece kind
    #[cfg_attr(feature = "serde", serde(rename = "type", default))]
    pub kind: PieceType,
}

impl VocabularyEntry {
    /// Create an entry
    pub fn new(piece: impl Into<String>, score: f32, kind: PieceType) -> Self {
        Self {
            piece: piece.into(),
            score,
            kind,
        }
    }

    /// Create a normal piece
    pub fn normal(piece: impl Into<String>, score: f32) -> Self {
        Self::new(piece, score, PieceType::Normal)
    }
}

/// Indices of the special marker pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    /// Index of the unknown piece
    pub unknown: usize,
    /// Index of the begin-of-sequence piece
    pub begin: usize,
    /// Index of the end-of-sequence piece
    pub end: usize,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            unknown: UNKNOWN_INDEX,
            begin: BEGIN_INDEX,
            end: END_INDEX,
        }
    }
}

/// Loaded, validated piece table
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
    index: HashMap<String, usize>,
    markers: Markers,
    max_piece_chars: usize,
}

impl Vocabulary {
    /// Build a vocabulary from decoded triples and marker indices
    ///
    /// Fails with [`VocabularyError::Format`] when the table is empty, the
    /// markers are not at the positions the ID remap expects, a marker piece
    /// has the wrong type, a score is NaN, or a piece is duplicated.
    pub fn new(entries: Vec<VocabularyEntry>, markers: Markers) -> Result<Self> {
        if entries.len() < 3 {
            return Err(VocabularyError::format(format!(
                "expected at least 3 pieces, found {}",
                entries.len()
            )));
        }
        if entries.len() >= u32::MAX as usize {
            return Err(VocabularyError::format("too many pieces"));
        }
        if markers != Markers::default() {
            return Err(VocabularyError::format(format!(
                "markers must be unk=0 bos=1 eos=2, got unk={} bos={} eos={}",
                markers.unknown, markers.begin, markers.end
            )));
        }
        if entries[UNKNOWN_INDEX].kind != PieceType::Unknown {
            return Err(VocabularyError::format(format!(
                "piece {UNKNOWN_INDEX} ({:?}) must be of type unknown",
                entries[UNKNOWN_INDEX].piece
            )));
        }
        for marker in [BEGIN_INDEX, END_INDEX] {
            if entries[marker].kind != PieceType::Control {
                return Err(VocabularyError::format(format!(
                    "piece {marker} ({:?}) must be of type control",
                    entries[marker].piece
                )));
            }
        }
        if !entries[UNKNOWN_INDEX].score.is_finite() {
            return Err(VocabularyError::format("unknown piece score must be finite"));
        }

        let mut index = HashMap::with_capacity(entries.len());
        let mut max_piece_chars = 1;
        for (i, entry) in entries.iter().enumerate() {
            if entry.score.is_nan() {
                return Err(VocabularyError::format(format!(
                    "piece {i} ({:?}) has a NaN score",
                    entry.piece
                )));
            }
            if entry.piece.is_empty() {
                return Err(VocabularyError::format(format!("piece {i} is empty")));
            }
            if index.insert(entry.piece.clone(), i).is_some() {
                return Err(VocabularyError::format(format!(
                    "duplicate piece {:?} at index {i}",
                    entry.piece
                )));
            }
            if entry.kind.is_matchable() {
                max_piece_chars = max_piece_chars.max(entry.piece.chars().count());
            }
        }

        Ok(Self {
            entries,
            index,
            markers,
            max_piece_chars,
        })
    }

    /// Build a vocabulary using the default marker layout
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Result<Self> {
        Self::new(entries, Markers::default())
    }

    /// Number of pieces
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty (never true for a validated vocabulary)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at an internal index
    pub fn entry(&self, index: usize) -> Option<&VocabularyEntry> {
        self.entries.get(index)
    }

    /// Piece text at an internal index
    pub fn piece(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.piece.as_str())
    }

    /// Internal index of any piece, matchable or not
    pub fn index_of(&self, piece: &str) -> Option<usize> {
        self.index.get(piece).copied()
    }

    /// Index and score of a piece the encoder may emit for raw text
    pub fn lookup(&self, piece: &str) -> Option<(usize, f32)> {
        let index = *self.index.get(piece)?;
        let entry = &self.entries[index];
        entry.kind.is_matchable().then_some((index, entry.score))
    }

    /// Score assigned to an unknown single-character fallback
    pub fn unknown_score(&self) -> f32 {
        self.entries[self.markers.unknown].score
    }

    /// Longest matchable piece, in chars
    pub fn max_piece_chars(&self) -> usize {
        self.max_piece_chars
    }

    /// Iterate over all entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &VocabularyEntry> {
        self.entries.iter()
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use std::io::Read;
    use std::path::Path;

    #[derive(serde::Deserialize)]
    struct VocabularyFile {
        pieces: Vec<VocabularyEntry>,
        #[serde(default)]
        unk_id: Option<usize>,
        #[serde(default)]
        bos_id: Option<usize>,
        #[serde(default)]
        eos_id: Option<usize>,
    }

    impl VocabularyFile {
        fn into_vocabulary(self) -> Result<Vocabulary> {
            let defaults = Markers::default();
            let markers = Markers {
                unknown: self.unk_id.unwrap_or(defaults.unknown),
                begin: self.bos_id.unwrap_or(defaults.begin),
                end: self.eos_id.unwrap_or(defaults.end),
            };
            Vocabulary::new(self.pieces, markers)
        }
    }

    impl Vocabulary {
        /// Parse a JSON vocabulary document
        pub fn from_json_str(json: &str) -> Result<Self> {
            let file: VocabularyFile = serde_json::from_str(json)?;
            file.into_vocabulary()
        }

        /// Parse a JSON vocabulary from a reader
        pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
            let file: VocabularyFile = serde_json::from_reader(reader)?;
            file.into_vocabulary()
        }

        /// Load a JSON vocabulary file
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
            let file = std::fs::File::open(path.as_ref())?;
            Self::from_json_reader(std::io::BufReader::new(file))
        }
    }
}
