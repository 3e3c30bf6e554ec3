//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Collects sentences and writes one JSON array on finish
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    source: Option<String>,
    sentences: Vec<SentenceData>,
}

/// One sentence in the JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct SentenceData {
    /// Sentence text, trimmed
    pub text: String,
    /// Byte offset of the untrimmed sentence in its document
    pub offset: usize,
    /// Byte length of the untrimmed sentence
    pub length: usize,
    /// Document the sentence came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a formatter writing pretty-printed JSON to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
            source: None,
            sentences: Vec::new(),
        }
    }

    /// Choose between pretty and compact output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn begin_document(&mut self, name: &str) -> Result<()> {
        self.source = Some(name.to_string());
        Ok(())
    }

    fn format_sentence(&mut self, sentence: &str, offset: usize) -> Result<()> {
        self.sentences.push(SentenceData {
            text: sentence.trim().to_string(),
            offset,
            length: sentence.len(),
            source: self.source.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &self.sentences)?;
        } else {
            serde_json::to_writer(&mut self.writer, &self.sentences)?;
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
