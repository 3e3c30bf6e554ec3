//! satsplit command-line entry point

use anyhow::Result;
use clap::Parser;
use satsplit_cli::commands::Commands;

/// Sentence segmentation with subword token scoring
#[derive(Debug, Parser)]
#[command(name = "satsplit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output and logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl Cli {
    fn init_logging(&self) {
        if self.quiet {
            return;
        }
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();
    log::debug!("Command: {:?}", cli.command);
    cli.command.execute(cli.quiet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["satsplit", "generate-config", "-vv", "-q"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::GenerateConfig(_)));
    }
}
