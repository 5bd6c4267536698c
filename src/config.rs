use std::env;

use ethers_core::types::Address;

use crate::codec::address::parse_address;
use crate::wei::{parse_wei, Wei, DEFAULT_TOLERANCE};

const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_bind_addr: String,
    pub tolerance_wei: Wei,
    pub max_body_bytes: usize,
    pub account: Option<Address>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("RECONCILE_TOLERANCE_WEI must be a non-negative integer, got {0:?}")]
    InvalidTolerance(String),
    #[error("MAX_BODY_BYTES must be a positive integer, got {0:?}")]
    InvalidBodyLimit(String),
    #[error("ACCOUNT_ADDRESS is not a 20-byte hex address: {0:?}")]
    InvalidAccount(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_bind_addr: "127.0.0.1:8080".to_string(),
            tolerance_wei: DEFAULT_TOLERANCE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            account: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let http_bind_addr = lookup("HTTP_BIND").unwrap_or(defaults.http_bind_addr);
        let tolerance_wei = match lookup("RECONCILE_TOLERANCE_WEI") {
            Some(raw) => parse_wei(raw.trim())
                .ok()
                .filter(|v| *v >= 0)
                .ok_or(ConfigError::InvalidTolerance(raw))?,
            None => defaults.tolerance_wei,
        };
        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::InvalidBodyLimit(raw))?,
            None => defaults.max_body_bytes,
        };
        let account = lookup("ACCOUNT_ADDRESS")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_address(&raw).map_err(|_| ConfigError::InvalidAccount(raw)))
            .transpose()?;

        Ok(Self {
            http_bind_addr,
            tolerance_wei,
            max_body_bytes,
            account,
        })
    }
}
