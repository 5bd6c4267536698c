//! Reconciliation and summaries over decoded records and backend aggregates.

pub mod aggregates;
pub mod bins;
pub mod blocks;
pub mod traces;

pub use aggregates::{analyze_aggregates, analyze_summaries, parse_aggregates};
pub use blocks::{analyze_blocks, analyze_blocks_with_tolerance};
pub use traces::{analyze_transaction_traces, TraceCategory, TraceFilter};
