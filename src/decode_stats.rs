//! Process-wide counters behind `/stats/decode`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::accounting::blocks::BlocksSummary;
use crate::accounting::traces::AnalyzedTracesSummary;
use crate::codec::CodecError;

#[derive(Debug)]
pub struct DecodeStats {
    blocks: AtomicU64,
    traces: AtomicU64,
    failures: AtomicU64,
    mismatches: AtomicU64,
}

impl Default for DecodeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeStats {
    pub const fn new() -> Self {
        Self {
            blocks: AtomicU64::new(0),
            traces: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            mismatches: AtomicU64::new(0),
        }
    }

    /// Counts the decoded entries of a block buffer and its flagged blocks.
    pub fn record_blocks(&self, summary: &BlocksSummary) {
        self.blocks
            .fetch_add(summary.total_entries as u64, Ordering::Relaxed);
        self.mismatches
            .fetch_add(summary.mismatches.len() as u64, Ordering::Relaxed);
    }

    /// Counts every analyzed trace, before any display filter is applied.
    pub fn record_traces(&self, summary: &AnalyzedTracesSummary) {
        self.traces
            .fetch_add(summary.transactions.len() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, err: &CodecError) {
        tracing::debug!("decode failure: {}", err);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DecodeSnapshot {
        DecodeSnapshot {
            blocks: self.blocks.load(Ordering::Relaxed),
            traces: self.traces.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            mismatches: self.mismatches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DecodeSnapshot {
    pub blocks: u64,
    pub traces: u64,
    pub failures: u64,
    pub mismatches: u64,
}

pub static DECODE_STATS: DecodeStats = DecodeStats::new();
