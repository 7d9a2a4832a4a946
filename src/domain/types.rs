//! Primitive identifiers shared by every component of the client.

use primitive_types::{H160, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::RpcError;

/// Wallet-controlled account address.
pub type Address = H160;

/// Salted keccak256 of an account, the on-chain identity used for registration and voting.
pub type CitizenId = H256;

/// Identifier of the network the wallet is connected to (`net_version`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub u64);

impl NetworkId {
    /// Local development chain (Ganache).
    pub const LOCAL_DEV: NetworkId = NetworkId(1337);

    pub fn is_local_dev(&self) -> bool {
        *self == Self::LOCAL_DEV
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notifications pushed by a wallet provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    NetworkChanged(NetworkId),
}

/// Parses a `0x`-prefixed (or bare) 20-byte hex address.
pub fn parse_address(raw: &str) -> Result<Address, RpcError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits)
        .map_err(|e| RpcError::decode(format!("invalid address '{}': {}", raw, e)))?;
    if bytes.len() != 20 {
        return Err(RpcError::decode(format!(
            "invalid address '{}': expected 20 bytes, got {}",
            raw,
            bytes.len()
        )));
    }
    Ok(H160::from_slice(&bytes))
}

/// Lowercase `0x`-prefixed form, the representation wallets hand out.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Short label shown once a wallet is connected, e.g. `0xf7ca9a...`.
pub fn short_address(address: &Address) -> String {
    let full = format_address(address);
    format!("{}...", &full[..8])
}

pub fn format_hash(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

pub fn parse_hash(raw: &str) -> Result<H256, RpcError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits)
        .map_err(|e| RpcError::decode(format!("invalid hash '{}': {}", raw, e)))?;
    if bytes.len() != 32 {
        return Err(RpcError::decode(format!(
            "invalid hash '{}': expected 32 bytes, got {}",
            raw,
            bytes.len()
        )));
    }
    Ok(H256::from_slice(&bytes))
}
