//! Time bins of block production used by the daily/epoch charts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::wei::{self, Wei};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBin {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub block_count: u64,
    pub withdrawal_count: u64,
    #[serde(with = "wei::serde_str")]
    pub withdrawal_amount: Wei,
    #[serde(with = "wei::serde_str")]
    pub epoch_total: Wei,
    pub epoch_avg_per_s: f64,
    pub epoch_avg_consensus: f64,
    #[serde(with = "wei::serde_str")]
    pub mev: Wei,
    pub epoch_no: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBinsSummary {
    pub all: Vec<BlockBin>,
    #[serde(default)]
    pub by_epoch: BTreeMap<u64, Vec<BlockBin>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BinTotals {
    pub blocks: u64,
    pub withdrawals: u64,
    #[serde(with = "wei::serde_str")]
    pub withdrawal_amount: Wei,
    #[serde(with = "wei::serde_str")]
    pub mev: Wei,
}

impl BlockBinsSummary {
    pub fn totals(&self) -> Result<BinTotals, CodecError> {
        self.all.iter().try_fold(BinTotals::default(), |acc, bin| {
            Ok(BinTotals {
                blocks: count(acc.blocks, bin.block_count, "blockCount")?,
                withdrawals: count(acc.withdrawals, bin.withdrawal_count, "withdrawalCount")?,
                withdrawal_amount: wei::add(
                    acc.withdrawal_amount,
                    bin.withdrawal_amount,
                    "withdrawalAmount",
                )?,
                mev: wei::add(acc.mev, bin.mev, "mev")?,
            })
        })
    }
}

fn count(a: u64, b: u64, what: &'static str) -> Result<u64, CodecError> {
    a.checked_add(b).ok_or(CodecError::AmountOverflow(what))
}

pub fn analyze_block_bin_response(json: &str) -> Result<BlockBinsSummary, CodecError> {
    let summary: BlockBinsSummary = serde_json::from_str(json)?;
    tracing::debug!(
        "parsed {} block bins across {} epochs",
        summary.all.len(),
        summary.by_epoch.len()
    );
    Ok(summary)
}
