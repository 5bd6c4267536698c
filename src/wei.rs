//! Wei-denominated amounts.
//!
//! JSON carries amounts as base-10 strings; the `serde_str` module reads and
//! writes that form so nothing passes through floating point.

use crate::codec::CodecError;

pub type Wei = i128;

pub const ETHER: Wei = 1_000_000_000_000_000_000;

/// 0.005 ether.
pub const DEFAULT_TOLERANCE: Wei = 5 * ETHER / 1000;

/// Strict base-10 parse: optional leading `-`, then ASCII digits only.
pub fn parse_wei(raw: &str) -> Result<Wei, CodecError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidNumber(raw.to_string()));
    }
    raw.parse::<Wei>()
        .map_err(|_| CodecError::InvalidNumber(raw.to_string()))
}

/// `a + b`, or an overflow error naming the quantity being summed.
pub fn add(a: Wei, b: Wei, what: &'static str) -> Result<Wei, CodecError> {
    a.checked_add(b).ok_or(CodecError::AmountOverflow(what))
}

pub fn sub(a: Wei, b: Wei, what: &'static str) -> Result<Wei, CodecError> {
    a.checked_sub(b).ok_or(CodecError::AmountOverflow(what))
}

pub mod serde_str {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::{parse_wei, Wei};

    pub fn serialize<S: Serializer>(value: &Wei, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
        deserializer.deserialize_any(WeiVisitor)
    }

    struct WeiVisitor;

    impl<'de> Visitor<'de> for WeiVisitor {
        type Value = Wei;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a base-10 integer string or an integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Wei, E> {
            parse_wei(v).map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Wei, E> {
            Ok(v as Wei)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Wei, E> {
            Ok(v as Wei)
        }
    }
}
