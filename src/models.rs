use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::CodecError;
use crate::wei::{self, Wei};

/// One mined block as seen from the tracked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub address: Address,
    pub block_number: u32,
    pub timestamp: i64,
    pub miner: Address,
    #[serde(with = "wei::serde_str")]
    pub balance: Wei,
    #[serde(with = "wei::serde_str")]
    pub balance_diff: Wei,
    #[serde(with = "wei::serde_str")]
    pub consensus_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub mev_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub block_reward: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_incoming: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_outgoing: Wei,
    #[serde(with = "wei::serde_str")]
    pub gas_used: Wei,
    #[serde(with = "wei::serde_str")]
    pub priority_fees: Wei,
}

impl BlockRecord {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

pub mod trace_flags {
    pub const EMPTY: u8 = 1 << 0;
    pub const MEV: u8 = 1 << 1;
    pub const SIMPLE: u8 = 1 << 2;
    pub const OUTGOING: u8 = 1 << 3;
    pub const FISHING: u8 = 1 << 4;
    pub const HAS_FROM: u8 = 1 << 5;
    pub const HAS_TO: u8 = 1 << 6;
}

/// One transaction's effect on the tracked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionTrace {
    pub address: Address,
    pub tx_hash: H256,
    pub block_number: u32,
    pub timestamp: i64,
    pub block_index: u16,
    pub is_empty: bool,
    pub is_mev: bool,
    pub is_simple: bool,
    pub is_outgoing: bool,
    pub is_fishing: bool,
    #[serde(with = "wei::serde_str")]
    pub amount_received: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_received_mev: Wei,
    #[serde(with = "wei::serde_str")]
    pub amount_sent: Wei,
    #[serde(with = "wei::serde_str")]
    pub gas_used: Wei,
    pub from_addr: Option<Address>,
    pub to_addr: Option<Address>,
}

impl TransactionTrace {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Packs the classification bits and the counterparty presence bits.
    pub fn flags(&self) -> u8 {
        use trace_flags::*;

        let mut flags = 0;
        for (set, bit) in [
            (self.is_empty, EMPTY),
            (self.is_mev, MEV),
            (self.is_simple, SIMPLE),
            (self.is_outgoing, OUTGOING),
            (self.is_fishing, FISHING),
            (self.from_addr.is_some(), HAS_FROM),
            (self.to_addr.is_some(), HAS_TO),
        ] {
            if set {
                flags |= bit;
            }
        }
        flags
    }

    /// An empty trace must not move value.
    pub fn is_consistent(&self) -> bool {
        !self.is_empty
            || (self.amount_received == 0 && self.amount_received_mev == 0 && self.amount_sent == 0)
    }
}

/// Calendar month key, written `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl FromStr for YearMonth {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidYearMonth(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
