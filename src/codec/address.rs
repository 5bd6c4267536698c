//! 20-byte account addresses.
//!
//! Addresses stay as raw [`Address`] bytes; text forms are derived on demand,
//! so mixed-case checksum rendering is always reconstructible.

use ethers_core::types::{Address, H256};
use ethers_core::utils::to_checksum;

use super::{CodecError, Reader};

pub const ADDRESS_LEN: usize = 20;
pub const HASH_LEN: usize = 32;

pub fn read_address(reader: &mut Reader<'_>) -> Result<Address, CodecError> {
    reader.array::<ADDRESS_LEN>().map(Address::from)
}

pub fn write_address(out: &mut Vec<u8>, address: &Address) {
    out.extend_from_slice(address.as_bytes());
}

pub fn read_hash(reader: &mut Reader<'_>) -> Result<H256, CodecError> {
    reader.array::<HASH_LEN>().map(H256::from)
}

pub fn write_hash(out: &mut Vec<u8>, hash: &H256) {
    out.extend_from_slice(hash.as_bytes());
}

/// Canonical lower-case `0x`-prefixed form.
pub fn to_lower_hex(address: &Address) -> String {
    format!("0x{:x}", address)
}

/// EIP-55 mixed-case form.
pub fn to_checksummed(address: &Address) -> String {
    to_checksum(address, None)
}

/// Accepts `0x`-prefixed or bare hex in any letter case.
pub fn parse_address(raw: &str) -> Result<Address, CodecError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() != ADDRESS_LEN * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidAddress(raw.to_string()));
    }
    digits
        .parse::<Address>()
        .map_err(|_| CodecError::InvalidAddress(raw.to_string()))
}
