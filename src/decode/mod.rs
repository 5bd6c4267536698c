//! Decoders for the backend's per-block and per-transaction record streams.
//!
//! Both streams are plain concatenations of records with no length prefixes.
//! A decode either consumes the whole buffer on a record boundary or fails;
//! partial record lists are never returned.

pub mod blocks;
pub mod traces;

pub use blocks::{decode_blocks, encode_blocks};
pub use traces::{decode_traces, encode_traces};
