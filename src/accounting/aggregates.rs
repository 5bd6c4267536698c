//! Monthly per-account aggregates precomputed by the backend.
//!
//! These arrive as JSON rather than in the binary stream. A month is
//! unbalanced when the backend's closure term `totalCheckZero` is non-zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::models::YearMonth;
use crate::wei::{self, Wei};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outgoing {
    pub year_month: YearMonth,
    pub address: Address,
    #[serde(with = "wei::serde_str")]
    pub amount: Wei,
    pub receiver_addr: Address,
}

/// Per-category movements over a period. Combined by plain summation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    #[serde(with = "wei::serde_str")]
    pub eth_delta: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_consensus: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_execution: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_mev: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_other: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_incoming: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_outgoing: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_gas_paid: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_inout: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_check_zero: Wei,
}

impl LedgerTotals {
    /// Field-wise sum; fails instead of wrapping.
    pub fn checked_add(&self, rhs: &LedgerTotals) -> Result<LedgerTotals, CodecError> {
        Ok(LedgerTotals {
            eth_delta: wei::add(self.eth_delta, rhs.eth_delta, "ethDelta")?,
            eth_consensus: wei::add(self.eth_consensus, rhs.eth_consensus, "ethConsensus")?,
            eth_execution: wei::add(self.eth_execution, rhs.eth_execution, "ethExecution")?,
            eth_mev: wei::add(self.eth_mev, rhs.eth_mev, "ethMev")?,
            eth_other: wei::add(self.eth_other, rhs.eth_other, "ethOther")?,
            total_incoming: wei::add(self.total_incoming, rhs.total_incoming, "totalIncoming")?,
            total_outgoing: wei::add(self.total_outgoing, rhs.total_outgoing, "totalOutgoing")?,
            total_gas_paid: wei::add(self.total_gas_paid, rhs.total_gas_paid, "totalGasPaid")?,
            total_inout: wei::add(self.total_inout, rhs.total_inout, "totalInout")?,
            total_check_zero: wei::add(
                self.total_check_zero,
                rhs.total_check_zero,
                "totalCheckZero",
            )?,
        })
    }
}

/// One account-month as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRecord {
    pub year_month: YearMonth,
    pub address: Address,
    #[serde(deserialize_with = "iso_ts::deserialize")]
    pub start_ts: DateTime<Utc>,
    #[serde(deserialize_with = "iso_ts::deserialize")]
    pub end_ts: DateTime<Utc>,
    pub block_start: u32,
    pub block_end: u32,
    pub month_completed: bool,
    #[serde(with = "wei::serde_str")]
    pub eth_start: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_end: Wei,
    #[serde(flatten)]
    pub totals: LedgerTotals,
    #[serde(default)]
    pub outgoings: Vec<Outgoing>,
}

impl AggregateRecord {
    pub fn is_balanced(&self) -> bool {
        self.totals.total_check_zero == 0
    }
}

/// A record after analysis: `end_ts` is inclusive (one second before the
/// backend's exclusive end).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    #[serde(flatten)]
    pub record: AggregateRecord,
    /// The period's end reaches the last second of its calendar month.
    pub month_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    /// `None` for summaries spanning several accounts.
    pub address: Option<Address>,
    pub start_ts: Option<DateTime<Utc>>,
    pub end_ts: Option<DateTime<Utc>>,
    pub block_start: u32,
    pub block_end: u32,
    pub month_completed: bool,
    #[serde(with = "wei::serde_str")]
    pub eth_start: Wei,
    #[serde(with = "wei::serde_str")]
    pub eth_end: Wei,
    #[serde(flatten)]
    pub totals: LedgerTotals,
    #[serde(default)]
    pub unbalanced_months: Vec<YearMonth>,
    #[serde(default)]
    pub outgoings: Vec<Outgoing>,
}

impl AggregateSummary {
    fn empty(address: Option<Address>) -> Self {
        Self {
            address,
            start_ts: None,
            end_ts: None,
            block_start: 0,
            block_end: 0,
            month_completed: false,
            eth_start: 0,
            eth_end: 0,
            totals: LedgerTotals::default(),
            unbalanced_months: Vec::new(),
            outgoings: Vec::new(),
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.totals.total_check_zero == 0
    }

    /// Outgoing transfers summed per receiver.
    pub fn outgoings_by_receiver(&self) -> Result<BTreeMap<Address, Wei>, CodecError> {
        let mut out = BTreeMap::new();
        for outgoing in &self.outgoings {
            let sum = out.entry(outgoing.receiver_addr).or_insert(0);
            *sum = wei::add(*sum, outgoing.amount, "outgoings")?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatesReport {
    pub aggregates: Vec<Aggregate>,
    pub summary: AggregateSummary,
}

pub fn parse_aggregates(json: &str) -> Result<Vec<AggregateRecord>, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Selects `address`'s months (optionally within `year`) and folds them into
/// a yearly summary.
pub fn analyze_aggregates(
    address: Address,
    records: &[AggregateRecord],
    year: Option<i32>,
) -> Result<AggregatesReport, CodecError> {
    let mut summary = AggregateSummary::empty(Some(address));
    let mut aggregates: Vec<Aggregate> = Vec::new();

    let selected = records
        .iter()
        .filter(|r| r.address == address)
        .filter(|r| year.map_or(true, |y| r.year_month.year == y));

    for record in selected {
        let end_inclusive = record.end_ts - Duration::seconds(1);
        let month_finished = end_inclusive.month() != record.end_ts.month();

        if aggregates.is_empty() {
            summary.start_ts = Some(record.start_ts);
            summary.block_start = record.block_start;
            summary.eth_start = record.eth_start;
        }
        summary.end_ts = Some(end_inclusive);
        summary.block_end = record.block_end;
        summary.eth_end = record.eth_end;
        summary.month_completed = record.month_completed;
        summary.totals = summary.totals.checked_add(&record.totals)?;
        summary.outgoings.extend(record.outgoings.iter().cloned());

        if !record.is_balanced() {
            tracing::warn!(
                "unbalanced month {} for 0x{:x}: check term {}",
                record.year_month,
                record.address,
                record.totals.total_check_zero
            );
            summary.unbalanced_months.push(record.year_month);
        }

        let mut analyzed = record.clone();
        analyzed.end_ts = end_inclusive;
        aggregates.push(Aggregate {
            record: analyzed,
            month_finished,
        });
    }

    tracing::debug!(
        "selected {} of {} aggregate months for 0x{:x}",
        aggregates.len(),
        records.len(),
        address
    );
    Ok(AggregatesReport {
        aggregates,
        summary,
    })
}

/// Folds per-account summaries into one. Every numeric field is a sum, min or
/// max, so grouping and order of the inputs do not change the result.
pub fn analyze_summaries(summaries: &[AggregateSummary]) -> Result<AggregateSummary, CodecError> {
    let mut total = AggregateSummary::empty(None);
    total.block_start = summaries.iter().map(|s| s.block_start).min().unwrap_or(0);
    total.block_end = summaries.iter().map(|s| s.block_end).max().unwrap_or(0);
    total.start_ts = summaries.iter().filter_map(|s| s.start_ts).min();
    total.end_ts = summaries.iter().filter_map(|s| s.end_ts).max();
    total.month_completed = !summaries.is_empty() && summaries.iter().all(|s| s.month_completed);

    for summary in summaries {
        total.eth_start = wei::add(total.eth_start, summary.eth_start, "ethStart")?;
        total.eth_end = wei::add(total.eth_end, summary.eth_end, "ethEnd")?;
        total.totals = total.totals.checked_add(&summary.totals)?;
        total
            .unbalanced_months
            .extend(summary.unbalanced_months.iter().copied());
        total.outgoings.extend(summary.outgoings.iter().cloned());
    }
    total.unbalanced_months.sort();
    total.unbalanced_months.dedup();
    Ok(total)
}

/// ISO-8601 timestamps with an offset, or naive ones taken as UTC.
mod iso_ts {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {:?}", raw)))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}
