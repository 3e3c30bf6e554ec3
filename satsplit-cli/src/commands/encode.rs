//! Encode command implementation

use super::ModelArgs;
use anyhow::Result;
use clap::Args;
use satsplit_tokenizer::Token;

/// Arguments for the encode command
#[derive(Debug, Args)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Print only the token ids
    #[arg(long)]
    pub ids_only: bool,

    /// Text to tokenize; several words are joined with spaces
    #[arg(value_name = "TEXT", required = true)]
    pub text: Vec<String>,
}

impl EncodeArgs {
    /// Execute the encode command
    pub fn execute(&self) -> Result<()> {
        let tokenizer = self.model.load_tokenizer()?;
        let text = self.text.join(" ");
        let tokens = tokenizer.encode(&text);
        log::debug!("{} tokens for {} bytes", tokens.len(), text.len());

        if self.ids_only {
            let ids: Vec<String> = tokens.iter().map(|t| t.id.to_string()).collect();
            println!("{}", ids.join(" "));
        } else {
            for token in &tokens {
                println!("{}", describe(token));
            }
        }
        Ok(())
    }
}

/// One line per token: id, piece and source byte range
fn describe(token: &Token) -> String {
    format!(
        "{:>6}  {:<16} {}..{}",
        token.id,
        format!("{:?}", token.piece),
        token.source_start,
        token.source_end
    )
}
