//! Gold corpus loading for evaluation
//!
//! Three gold formats are understood:
//!
//! - JSON documents carrying the text and its sentence end offsets
//!   (`{"name", "source", "text", "sentences", "boundaries"}`)
//! - transcripts with a `# Source:` header, whose sentences are recovered
//!   by splitting at terminal punctuation outside known abbreviations
//! - plain files with one sentence per line
//!
//! Offsets are byte offsets into the document text.

use crate::{
    error::{EngineError, Result},
    eval::Document,
};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ABBREVIATIONS: &str = r"(?i)\b(Mr|Mrs|Ms|Dr|Prof|Sr|Jr|vs|etc|i\.e|e\.g|U\.S|U\.K)\.$";

/// Layout of a gold file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoldFormat {
    /// One sentence per line, joined with single spaces
    Lines,
    /// JSON document with explicit boundaries
    Json,
    /// Header-annotated transcript
    Transcript,
}

impl GoldFormat {
    /// Pick a format from the file extension and contents
    ///
    /// `.json` files are JSON; otherwise a first non-blank line starting
    /// with `#` marks a transcript.
    pub fn detect(path: &Path, contents: &str) -> Self {
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            return GoldFormat::Json;
        }
        match contents.lines().map(str::trim).find(|line| !line.is_empty()) {
            Some(line) if line.starts_with('#') => GoldFormat::Transcript,
            _ => GoldFormat::Lines,
        }
    }
}

/// Metadata from a transcript header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptHeader {
    /// Where the transcript came from
    pub source: String,
    /// Speaker, if given
    pub speaker: Option<String>,
    /// Title, if given
    pub title: Option<String>,
}

/// Split a transcript into its header and trimmed body
///
/// Header lines start with `#`; blank lines between them are skipped. A
/// header without `Source:` is rejected.
pub fn parse_header(text: &str) -> Result<(TranscriptHeader, &str)> {
    let mut header = TranscriptHeader::default();
    let mut body_start = text.len();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if let Some(field) = content.strip_prefix('#') {
            let field = field.trim_start();
            if let Some(value) = field.strip_prefix("Source:") {
                header.source = value.trim().to_string();
            } else if let Some(value) = field.strip_prefix("Speaker:") {
                header.speaker = Some(value.trim().to_string());
            } else if let Some(value) = field.strip_prefix("Title:") {
                header.title = Some(value.trim().to_string());
            }
        } else if !content.trim().is_empty() {
            body_start = offset;
            break;
        }
        offset += line.len();
    }

    if header.source.is_empty() {
        return Err(EngineError::Corpus(
            "missing Source in transcript header".to_string(),
        ));
    }
    Ok((header, text[body_start..].trim()))
}

#[derive(Debug, Deserialize)]
struct GoldFile {
    #[serde(default)]
    name: String,
    text: String,
    #[serde(default)]
    sentences: Option<usize>,
    #[serde(default)]
    boundaries: Vec<usize>,
}

/// Reads gold documents in any [`GoldFormat`]
#[derive(Debug, Clone)]
pub struct CorpusLoader {
    abbreviation: Regex,
}

impl CorpusLoader {
    /// Create a loader
    pub fn new() -> Result<Self> {
        let abbreviation = Regex::new(ABBREVIATIONS)
            .map_err(|e| EngineError::ConfigError(format!("abbreviation pattern: {e}")))?;
        Ok(Self { abbreviation })
    }

    /// Heuristic sentence end offsets of `text`
    ///
    /// A sentence ends after `.`, `?` or `!` followed by a space, a newline
    /// or the end of the text, unless a `.` closes a known abbreviation.
    pub fn sentence_ends(&self, text: &str) -> Vec<usize> {
        let bytes = text.as_bytes();
        let mut ends = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            let ch = bytes[i];
            if matches!(ch, b'.' | b'?' | b'!') {
                let at_break = i + 1 == bytes.len() || matches!(bytes[i + 1], b' ' | b'\n');
                if at_break && !(ch == b'.' && self.abbreviation.is_match(&text[start..=i])) {
                    ends.push(i + 1);
                    while i + 1 < bytes.len() && matches!(bytes[i + 1], b' ' | b'\n') {
                        i += 1;
                    }
                    start = i + 1;
                }
            }
            i += 1;
        }
        ends
    }

    /// Parse gold `contents` in the given format
    pub fn parse(&self, name: &str, contents: &str, format: GoldFormat) -> Result<Document> {
        match format {
            GoldFormat::Lines => {
                let sentences: Vec<&str> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect();
                if sentences.is_empty() {
                    return Err(EngineError::Corpus("no sentences".to_string()));
                }
                Ok(Document::from_sentences(&sentences).with_name(name))
            }
            GoldFormat::Json => {
                let gold: GoldFile = serde_json::from_str(contents)?;
                if let Some(count) = gold.sentences {
                    if count != gold.boundaries.len() {
                        log::warn!(
                            "{name}: declares {count} sentences but lists {} boundaries",
                            gold.boundaries.len()
                        );
                    }
                }
                let name = if gold.name.is_empty() {
                    name
                } else {
                    gold.name.as_str()
                };
                Ok(Document::from_boundaries(name, gold.text.as_str(), &gold.boundaries))
            }
            GoldFormat::Transcript => {
                let (header, body) = parse_header(contents)?;
                log::debug!("{name}: transcript from {}", header.source);
                let ends = self.sentence_ends(body);
                Ok(Document::from_boundaries(name, body, &ends))
            }
        }
    }

    /// Load one gold file; `None` detects the format
    ///
    /// The document is named after the file stem unless the file names it.
    pub fn load_file(&self, path: &Path, format: Option<GoldFormat>) -> Result<Document> {
        let contents = fs::read_to_string(path).map_err(|e| in_file(path, e.into()))?;
        let format = format.unwrap_or_else(|| GoldFormat::detect(path, &contents));
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse(&name, &contents, format)
            .map_err(|e| in_file(path, e))
    }

    /// Load every `.json` and `.txt` file directly inside `dir`
    ///
    /// Files load in path order with detected formats; other files and
    /// subdirectories are skipped.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| in_file(dir, e.into()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file() && is_gold_file(path))
            .collect();
        paths.sort();

        log::debug!("loading {} gold files from {}", paths.len(), dir.display());
        paths
            .iter()
            .map(|path| self.load_file(path, None))
            .collect()
    }
}

fn is_gold_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("txt")
    })
}

fn in_file(path: &Path, err: EngineError) -> EngineError {
    match err {
        EngineError::Corpus(msg) => EngineError::Corpus(format!("{}: {msg}", path.display())),
        EngineError::IoError(msg) => EngineError::IoError(format!("{}: {msg}", path.display())),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TRANSCRIPT: &str = "# Source: https://example.com/talk\n\
                              # Speaker: Jane Doe\n\
                              \n\
                              Hello world. How are you?\nFine!\n";

    #[test]
    fn test_parse_header() {
        let (header, body) = parse_header(TRANSCRIPT).unwrap();
        assert_eq!(header.source, "https://example.com/talk");
        assert_eq!(header.speaker.as_deref(), Some("Jane Doe"));
        assert_eq!(header.title, None);
        assert_eq!(body, "Hello world. How are you?\nFine!");
    }

    #[test]
    fn test_parse_header_requires_source() {
        let err = parse_header("# Speaker: Jane\n# Title: Talk\n\nHello.").unwrap_err();
        assert!(matches!(err, EngineError::Corpus(_)));
    }

    #[test]
    fn test_sentence_ends() {
        let loader = CorpusLoader::new().unwrap();
        assert_eq!(loader.sentence_ends("Hello world. How are you?"), vec![12, 25]);
        assert_eq!(loader.sentence_ends("Wow! That's great."), vec![4, 18]);
        assert_eq!(loader.sentence_ends("Version 1.5 is out"), Vec::<usize>::new());
        assert!(loader.sentence_ends("").is_empty());
    }

    #[test]
    fn test_sentence_ends_skip_abbreviations() {
        let loader = CorpusLoader::new().unwrap();
        assert_eq!(
            loader.sentence_ends("Dr. Smith arrived. He sat."),
            vec![18, 26]
        );
        assert_eq!(loader.sentence_ends("Cats vs. dogs. Yes!"), vec![14, 19]);
    }

    #[test]
    fn test_transcript_document_keeps_layout() {
        let loader = CorpusLoader::new().unwrap();
        let doc = loader
            .parse("talk", TRANSCRIPT, GoldFormat::Transcript)
            .unwrap();
        assert_eq!(doc.name, "talk");
        assert_eq!(doc.text, "Hello world. How are you?\nFine!");
        assert_eq!(doc.boundaries, vec![12, 25]);
    }

    #[test]
    fn test_json_document_with_multibyte_text() {
        let loader = CorpusLoader::new().unwrap();
        let json = r#"{
            "name": "fr-sample",
            "source": "hand written",
            "text": "Première phrase. Deuxième phrase.",
            "sentences": 2,
            "boundaries": [17, 35]
        }"#;
        let doc = loader.parse("file-stem", json, GoldFormat::Json).unwrap();
        assert_eq!(doc.name, "fr-sample");
        assert_eq!(doc.boundaries, vec![17]);
        assert_eq!(&doc.text[..17], "Première phrase.");
    }

    #[test]
    fn test_json_document_errors() {
        let loader = CorpusLoader::new().unwrap();
        let err = loader
            .parse("bad", r#"{"boundaries": [3]}"#, GoldFormat::Json)
            .unwrap_err();
        assert!(matches!(err, EngineError::Corpus(_)));
    }

    #[test]
    fn test_lines_document() {
        let loader = CorpusLoader::new().unwrap();
        let doc = loader
            .parse("gold", "Hello world.\n\nHow are you?\n", GoldFormat::Lines)
            .unwrap();
        assert_eq!(doc.text, "Hello world. How are you?");
        assert_eq!(doc.boundaries, vec![12]);

        assert!(loader.parse("empty", "\n  \n", GoldFormat::Lines).is_err());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            GoldFormat::detect(Path::new("a.JSON"), "# not json"),
            GoldFormat::Json
        );
        assert_eq!(
            GoldFormat::detect(Path::new("a.txt"), "\n# Source: x\nHi."),
            GoldFormat::Transcript
        );
        assert_eq!(
            GoldFormat::detect(Path::new("a.txt"), "Hi.\nThere."),
            GoldFormat::Lines
        );
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{"text": "One. Two.", "boundaries": [4, 9]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("a.txt"), TRANSCRIPT).unwrap();
        fs::write(dir.path().join("c.txt"), "Hello.\nBye.\n").unwrap();
        fs::write(dir.path().join("notes.md"), "# ignored").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let loader = CorpusLoader::new().unwrap();
        let docs = loader.load_dir(dir.path()).unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(docs[0].boundaries, vec![12, 25]);
        assert_eq!(docs[1].boundaries, vec![4]);
        assert_eq!(docs[2].text, "Hello. Bye.");
    }

    #[test]
    fn test_load_file_errors_name_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();

        let loader = CorpusLoader::new().unwrap();
        let err = loader.load_file(&path, None).unwrap_err();
        assert!(err.to_string().contains("broken.json"));

        let err = loader
            .load_file(&dir.path().join("missing.txt"), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::IoError(_)));
    }
}
