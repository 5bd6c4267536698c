//! Low-level pieces of the backend's binary wire format.

pub mod address;
pub mod packed;
pub mod reader;

pub use reader::Reader;

/// Seconds added to every encoded 32-bit timestamp to get unix time
/// (2020-01-01T05:00:00Z).
pub const TIMESTAMP_EPOCH_OFFSET: i64 = 1_577_854_800;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("buffer truncated: wanted {wanted} bytes at offset {offset}, buffer has {len}")]
    UnexpectedEof {
        offset: usize,
        wanted: usize,
        len: usize,
    },
    #[error("decoder stopped at offset {offset}, buffer length is {len}")]
    Misaligned { offset: usize, len: usize },
    #[error("timestamp {0} cannot be encoded as an epoch offset")]
    TimestampOutOfRange(i64),
    #[error("amount overflow while summing {0}")]
    AmountOverflow(&'static str),
    #[error("invalid integer value: {0:?}")]
    InvalidNumber(String),
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),
    #[error("invalid year-month: {0:?}")]
    InvalidYearMonth(String),
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn timestamp_from_offset(offset: u32) -> i64 {
    offset as i64 + TIMESTAMP_EPOCH_OFFSET
}

pub fn timestamp_to_offset(timestamp: i64) -> Result<u32, CodecError> {
    u32::try_from(timestamp - TIMESTAMP_EPOCH_OFFSET)
        .map_err(|_| CodecError::TimestampOutOfRange(timestamp))
}
