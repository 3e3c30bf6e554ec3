//! Whitespace normalization ahead of tokenization
//!
//! Every run of whitespace becomes a single `▁`, trailing whitespace is
//! dropped, and a `▁` is prepended before the first character so that every
//! word starts with the boundary marker. The transform also records where
//! each normalized character came from in the input, which is what lets
//! token offsets be mapped back onto the caller's text.

/// Word boundary marker (U+2581 LOWER ONE EIGHTH BLOCK)
pub const WORD_BOUNDARY: char = '\u{2581}';

/// Normalized text together with its alignment to the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    text: String,
    // Byte offset in `text` of each char boundary; `chars + 1` entries.
    char_bytes: Vec<usize>,
    // Byte offset in the source text of each char boundary; `chars + 1` entries.
    source: Vec<usize>,
}

impl Normalized {
    /// The normalized text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing survived normalization
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of chars
    pub fn char_len(&self) -> usize {
        self.char_bytes.len() - 1
    }

    /// Byte offset in the normalized text of char boundary `i`
    pub fn byte_offset(&self, i: usize) -> usize {
        self.char_bytes[i]
    }

    /// Byte offset in the source text of char boundary `i`
    pub fn source_offset(&self, i: usize) -> usize {
        self.source[i]
    }

    /// Substring between two char boundaries
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[self.char_bytes[start]..self.char_bytes[end]]
    }
}

/// Normalize `text` for the Unigram encoder
pub fn normalize(text: &str) -> Normalized {
    let mut out = String::with_capacity(text.len() + WORD_BOUNDARY.len_utf8());
    let mut char_bytes = Vec::with_capacity(text.len() + 2);
    let mut source = Vec::with_capacity(text.len() + 2);

    let mut push = |out: &mut String, ch: char, origin: usize| {
        char_bytes.push(out.len());
        source.push(origin);
        out.push(ch);
    };

    let mut started = false;
    let mut pending_run: Option<usize> = None;
    let mut last_end = 0;

    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if started && pending_run.is_none() {
                pending_run = Some(offset);
            }
            continue;
        }

        if !started {
            push(&mut out, WORD_BOUNDARY, offset);
            started = true;
        } else if let Some(run_start) = pending_run.take() {
            push(&mut out, WORD_BOUNDARY, run_start);
        }
        push(&mut out, ch, offset);
        last_end = offset + ch.len_utf8();
    }

    char_bytes.push(out.len());
    source.push(last_end);

    Normalized {
        text: out,
        char_bytes,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cases() {
        let cases = [
            ("Hello", "▁Hello"),
            ("Hello world", "▁Hello▁world"),
            ("  spaces  ", "▁spaces"),
            ("a\t\n b", "▁a▁b"),
            ("", ""),
            ("   ", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize(input).as_str(), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_alignment_maps_back_to_source() {
        let text = "Hi  there";
        let n = normalize(text);
        assert_eq!(n.as_str(), "▁Hi▁there");
        assert_eq!(n.char_len(), 9);

        // prepended marker and first char both map to 0
        assert_eq!(n.source_offset(0), 0);
        assert_eq!(n.source_offset(1), 0);
        // marker replacing "  " maps to the start of the run
        assert_eq!(n.source_offset(3), 2);
        // 't' follows the run
        assert_eq!(n.source_offset(4), 4);
        // end boundary is the end of the last visible char
        assert_eq!(n.source_offset(9), text.len());
    }

    #[test]
    fn test_trailing_whitespace_end_offset() {
        let text = "end.  \n";
        let n = normalize(text);
        assert_eq!(n.as_str(), "▁end.");
        assert_eq!(n.source_offset(n.char_len()), 4);
    }

    #[test]
    fn test_byte_offsets_for_multibyte() {
        let n = normalize("日本");
        assert_eq!(n.char_len(), 3);
        assert_eq!(n.byte_offset(1), WORD_BOUNDARY.len_utf8());
        assert_eq!(n.slice(1, 3), "日本");
        assert_eq!(n.source_offset(2), 3);
    }
}
