use std::collections::BTreeMap;

use ethers_core::types::H256;
use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::models::TransactionTrace;
use crate::wei::{self, Wei};

/// Display category of a trace. Precedence is MEV, spam, outgoing, incoming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceCategory {
    Mev,
    Spam,
    Outgoing,
    Incoming,
    Unknown,
}

impl TraceCategory {
    pub fn label(self) -> &'static str {
        match self {
            TraceCategory::Mev => "MEV",
            TraceCategory::Spam => "Spam",
            TraceCategory::Outgoing => "Outgoing",
            TraceCategory::Incoming => "Incoming",
            TraceCategory::Unknown => "Unknown",
        }
    }
}

impl TransactionTrace {
    pub fn category(&self) -> TraceCategory {
        if self.is_mev {
            TraceCategory::Mev
        } else if self.is_fishing {
            TraceCategory::Spam
        } else if self.is_outgoing {
            TraceCategory::Outgoing
        } else if self.amount_received > 0 {
            TraceCategory::Incoming
        } else {
            TraceCategory::Unknown
        }
    }

    /// Amount shown for the trace: the MEV channel for MEV payouts.
    pub fn display_amount(&self) -> Wei {
        match self.category() {
            TraceCategory::Mev => self.amount_received_mev,
            TraceCategory::Outgoing => self.amount_sent,
            _ => self.amount_received,
        }
    }
}

/// Which categories a consumer wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceFilter {
    pub mev: bool,
    pub spam: bool,
    pub outgoing: bool,
    pub incoming: bool,
    pub unknown: bool,
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self {
            mev: true,
            spam: true,
            outgoing: true,
            incoming: true,
            unknown: true,
        }
    }
}

impl TraceFilter {
    pub fn accepts(&self, trace: &TransactionTrace) -> bool {
        match trace.category() {
            TraceCategory::Mev => self.mev,
            TraceCategory::Spam => self.spam,
            TraceCategory::Outgoing => self.outgoing,
            TraceCategory::Incoming => self.incoming,
            TraceCategory::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedTracesSummary {
    #[serde(with = "wei::serde_str")]
    pub total_received: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_received_mev: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_sent: Wei,
    #[serde(with = "wei::serde_str")]
    pub total_gas_used: Wei,
    pub categories: BTreeMap<TraceCategory, usize>,
    /// Empty traces that still carry value.
    pub inconsistent: Vec<H256>,
    pub transactions: Vec<TransactionTrace>,
}

impl AnalyzedTracesSummary {
    pub fn filtered<'a>(
        &'a self,
        filter: &'a TraceFilter,
    ) -> impl Iterator<Item = &'a TransactionTrace> + 'a {
        self.transactions.iter().filter(move |tr| filter.accepts(tr))
    }

    pub fn count(&self, category: TraceCategory) -> usize {
        self.categories.get(&category).copied().unwrap_or(0)
    }
}

pub fn analyze_transaction_traces(
    traces: Vec<TransactionTrace>,
) -> Result<AnalyzedTracesSummary, CodecError> {
    let mut summary = AnalyzedTracesSummary {
        total_received: 0,
        total_received_mev: 0,
        total_sent: 0,
        total_gas_used: 0,
        categories: BTreeMap::new(),
        inconsistent: Vec::new(),
        transactions: Vec::new(),
    };

    for trace in &traces {
        summary.total_received =
            wei::add(summary.total_received, trace.amount_received, "amountReceived")?;
        summary.total_received_mev =
            wei::add(summary.total_received_mev, trace.amount_received_mev, "amountReceivedMev")?;
        summary.total_sent = wei::add(summary.total_sent, trace.amount_sent, "amountSent")?;
        summary.total_gas_used = wei::add(summary.total_gas_used, trace.gas_used, "gasUsed")?;
        *summary.categories.entry(trace.category()).or_default() += 1;

        if !trace.is_consistent() {
            tracing::warn!(
                "empty trace {:#x} in block {} carries value",
                trace.tx_hash,
                trace.block_number
            );
            summary.inconsistent.push(trace.tx_hash);
        }
    }

    summary.transactions = traces;
    Ok(summary)
}
