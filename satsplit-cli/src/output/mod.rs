//! Output formatting module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Start a new input document
    fn begin_document(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Format and output a single sentence at `offset` bytes into its document
    fn format_sentence(&mut self, sentence: &str, offset: usize) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text with one sentence per line
    #[default]
    Text,
    /// JSON array of sentences with offsets
    Json,
    /// Markdown numbered list
    Markdown,
}

/// Output sink shared by every formatter
pub type Sink = Box<dyn Write + Send + Sync>;

/// Build the formatter for `format`
pub fn create_formatter(
    format: OutputFormat,
    sink: Sink,
    pretty_json: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(sink)),
        OutputFormat::Json => Box::new(JsonFormatter::new(sink).pretty(pretty_json)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter::new(sink)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// Writer capturing output for assertions
    #[derive(Clone, Default)]
    pub struct Captured(pub Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
