//! Viterbi search over the Unigram lattice

use crate::normalize::Normalized;
use crate::vocab::{Vocabulary, UNKNOWN_INDEX};

/// One piece on the best path, in char positions of the normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathPiece {
    pub start: usize,
    pub end: usize,
    pub index: usize,
}

/// Find the maximum-probability segmentation of `normalized`
///
/// Candidate lengths are tried shortest first and only a strictly better
/// score replaces the current best, so exact ties keep the shorter piece.
/// Positions no piece can reach fall back to a one-char unknown piece, which
/// keeps every prefix reachable.
pub(crate) fn best_path(vocab: &Vocabulary, normalized: &Normalized) -> Vec<PathPiece> {
    let n = normalized.char_len();
    if n == 0 {
        return Vec::new();
    }

    let mut best = vec![f64::NEG_INFINITY; n + 1];
    let mut parent = vec![0usize; n + 1];
    let mut piece_at = vec![UNKNOWN_INDEX; n + 1];
    best[0] = 0.0;

    let unknown_score = f64::from(vocab.unknown_score());
    let max_len = vocab.max_piece_chars();

    for end in 1..=n {
        for len in 1..=max_len.min(end) {
            let start = end - len;
            let Some((index, score)) = vocab.lookup(normalized.slice(start, end)) else {
                continue;
            };
            let candidate = best[start] + f64::from(score);
            if candidate > best[end] {
                best[end] = candidate;
                parent[end] = start;
                piece_at[end] = index;
            }
        }

        if best[end] == f64::NEG_INFINITY {
            best[end] = best[end - 1] + unknown_score;
            parent[end] = end - 1;
            piece_at[end] = UNKNOWN_INDEX;
        }
    }

    let mut path = Vec::new();
    let mut end = n;
    while end > 0 {
        let start = parent[end];
        debug_assert!(start < end, "viterbi backpointer must move left");
        path.push(PathPiece {
            start,
            end,
            index: piece_at[end],
        });
        end = start;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::vocab::{PieceType, VocabularyEntry};

    fn vocab(pieces: &[(&str, f32)]) -> Vocabulary {
        let mut entries = vec![
            VocabularyEntry::new("<unk>", -10.0, PieceType::Unknown),
            VocabularyEntry::new("<s>", 0.0, PieceType::Control),
            VocabularyEntry::new("</s>", 0.0, PieceType::Control),
        ];
        entries.extend(pieces.iter().map(|&(p, s)| VocabularyEntry::normal(p, s)));
        Vocabulary::from_entries(entries).unwrap()
    }

    fn pieces(vocab: &Vocabulary, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        best_path(vocab, &normalized)
            .into_iter()
            .map(|p| normalized.slice(p.start, p.end).to_string())
            .collect()
    }

    #[test]
    fn test_prefers_single_high_probability_piece() {
        let v = vocab(&[("▁", -0.1), ("a", -1.0), ("ab", -0.5), ("b", -1.0)]);
        assert_eq!(pieces(&v, "ab"), vec!["▁", "ab"]);
    }

    #[test]
    fn test_prefers_split_when_cheaper() {
        let v = vocab(&[("▁", -0.1), ("a", -0.1), ("ab", -5.0), ("b", -0.1)]);
        assert_eq!(pieces(&v, "ab"), vec!["▁", "a", "b"]);
    }

    #[test]
    fn test_tie_keeps_shorter_piece() {
        // "▁a"+"b" and "▁"+"ab" both score -2; the last position tries "b"
        // (len 1) before "ab" (len 2) and keeps it.
        let v = vocab(&[("▁", -1.0), ("▁a", -1.0), ("ab", -1.0), ("b", -1.0)]);
        assert_eq!(pieces(&v, "ab"), vec!["▁a", "b"]);
    }

    #[test]
    fn test_unknown_fallback_covers_gaps() {
        let v = vocab(&[("▁", -1.0)]);
        let normalized = normalize("xy");
        let path = best_path(&v, &normalized);
        assert_eq!(path.len(), 3);
        assert_eq!(path[1].index, UNKNOWN_INDEX);
        assert_eq!(path[2].index, UNKNOWN_INDEX);
        assert_eq!((path[2].start, path[2].end), (2, 3));
    }

    #[test]
    fn test_empty_input() {
        let v = vocab(&[]);
        assert!(best_path(&v, &normalize("")).is_empty());
    }
}
