mod cli;

use std::path::Path;

use anyhow::{anyhow, Context};
use clap::Parser;
use ethers_core::types::Address;
use serde::Serialize;

use eth_reward_ledger::accounting::aggregates::AggregateSummary;
use eth_reward_ledger::accounting::bins::analyze_block_bin_response;
use eth_reward_ledger::accounting::{
    analyze_aggregates, analyze_blocks_with_tolerance, analyze_summaries,
    analyze_transaction_traces, parse_aggregates, TraceFilter,
};
use eth_reward_ledger::api::{self, AppState};
use eth_reward_ledger::codec::address::parse_address;
use eth_reward_ledger::config::Config;
use eth_reward_ledger::decode::{decode_blocks, decode_traces};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            let state = AppState {
                tolerance_wei: config.tolerance_wei,
                max_body_bytes: config.max_body_bytes,
            };
            api::run_http_server(&bind, state).await?;
        }
        Commands::Blocks { file, address } => {
            let account = resolve_account(address.as_deref(), &config)?;
            let buf = read_file(&file)?;
            let blocks = decode_blocks(&buf, account)
                .with_context(|| format!("failed to decode blocks from {}", file.display()))?;
            let summary = analyze_blocks_with_tolerance(&blocks, config.tolerance_wei)?;
            if !summary.is_reconciled() {
                tracing::warn!("{} blocks do not reconcile", summary.mismatches.len());
            }
            print_json(&summary)?;
        }
        Commands::Traces {
            file,
            address,
            hide_mev,
            hide_spam,
            hide_outgoing,
            hide_incoming,
            hide_unknown,
        } => {
            let account = resolve_account(address.as_deref(), &config)?;
            let buf = read_file(&file)?;
            let traces = decode_traces(&buf, account)
                .with_context(|| format!("failed to decode traces from {}", file.display()))?;
            let filter = TraceFilter {
                mev: !hide_mev,
                spam: !hide_spam,
                outgoing: !hide_outgoing,
                incoming: !hide_incoming,
                unknown: !hide_unknown,
            };
            let mut summary = analyze_transaction_traces(traces)?;
            for (category, count) in &summary.categories {
                tracing::info!("{}: {} traces", category.label(), count);
            }
            summary.transactions.retain(|tr| filter.accepts(tr));
            print_json(&summary)?;
        }
        Commands::Aggregates {
            file,
            address,
            year,
        } => {
            let account = resolve_account(address.as_deref(), &config)?;
            let json = read_text(&file)?;
            let records = parse_aggregates(&json)
                .with_context(|| format!("failed to parse aggregates from {}", file.display()))?;
            print_json(&analyze_aggregates(account, &records, year)?)?;
        }
        Commands::Summaries { file } => {
            let json = read_text(&file)?;
            let summaries: Vec<AggregateSummary> = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse summaries from {}", file.display()))?;
            print_json(&analyze_summaries(&summaries)?)?;
        }
        Commands::Bins { file } => {
            let json = read_text(&file)?;
            let bins = analyze_block_bin_response(&json)
                .with_context(|| format!("failed to parse block bins from {}", file.display()))?;
            let totals = bins.totals()?;
            print_json(&serde_json::json!({ "totals": totals, "bins": bins }))?;
        }
    }

    Ok(())
}

fn resolve_account(arg: Option<&str>, config: &Config) -> anyhow::Result<Address> {
    match arg {
        Some(raw) => Ok(parse_address(raw)?),
        None => config
            .account
            .ok_or_else(|| anyhow!("no --address given and ACCOUNT_ADDRESS is unset")),
    }
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
