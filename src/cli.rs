use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "eth-reward-ledger",
    version,
    about = "Decode and reconcile validator reward ledgers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a binary block record stream and print the reconciliation summary
    Blocks {
        #[arg(long)]
        file: PathBuf,
        /// Account the stream was fetched for (defaults to ACCOUNT_ADDRESS)
        #[arg(long)]
        address: Option<String>,
    },
    /// Decode a binary transaction trace stream and print the analyzed traces
    Traces {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        hide_mev: bool,
        #[arg(long)]
        hide_spam: bool,
        #[arg(long)]
        hide_outgoing: bool,
        #[arg(long)]
        hide_incoming: bool,
        /// Hide traces that move no value to or from the account
        #[arg(long)]
        hide_unknown: bool,
    },
    /// Summarize monthly aggregate JSON for one account
    Aggregates {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        address: Option<String>,
        /// Only months of this calendar year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Combine per-account summary JSON into one
    Summaries {
        #[arg(long)]
        file: PathBuf,
    },
    /// Parse block-bin chart JSON and print bins with totals
    Bins {
        #[arg(long)]
        file: PathBuf,
    },
    /// Run the HTTP API server
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traces_accepts_every_hide_flag() {
        let cli = Cli::try_parse_from([
            "eth-reward-ledger",
            "traces",
            "--file",
            "traces.bin",
            "--hide-spam",
            "--hide-unknown",
        ])
        .unwrap();
        match cli.command {
            Commands::Traces {
                hide_mev,
                hide_spam,
                hide_unknown,
                ..
            } => {
                assert!(!hide_mev);
                assert!(hide_spam);
                assert!(hide_unknown);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
