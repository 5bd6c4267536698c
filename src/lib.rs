//! Decoding and reconciliation of validator reward ledgers.
//!
//! The backend ships per-block and per-transaction records in a compact
//! binary form ([`decode`]) and monthly aggregates as JSON. The
//! [`accounting`] analyzers turn both into summaries and flag any block or
//! month whose ledger does not reconcile. Nothing here performs I/O.

pub mod accounting;
pub mod api;
pub mod codec;
pub mod config;
pub mod decode;
pub mod decode_stats;
pub mod models;
pub mod wei;
