//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://127.0.0.1:7545";
pub const DEFAULT_MANIFEST_PATH: &str = "build/contracts/Civics.json";
pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Wallet endpoint that requires `eth_requestAccounts` authorization.
    pub wallet_rpc_url: Option<String>,
    /// Wallet endpoint that exposes accounts without a prompt.
    pub legacy_rpc_url: Option<String>,
    /// Local development node, always tried last.
    pub local_rpc_url: String,
    pub manifest_path: PathBuf,
    /// How often providers are polled for account / network changes.
    pub event_poll: Duration,
    pub receipt_poll: Duration,
    pub receipt_poll_attempts: u32,
    pub http_bind: String,
}

impl ClientConfig {
    /// Reads `CIVIC_*` variables; call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            wallet_rpc_url: optional("CIVIC_WALLET_RPC_URL"),
            legacy_rpc_url: optional("CIVIC_LEGACY_RPC_URL"),
            local_rpc_url: optional("CIVIC_LOCAL_RPC_URL")
                .unwrap_or_else(|| DEFAULT_LOCAL_RPC_URL.to_string()),
            manifest_path: optional("CIVIC_MANIFEST_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH)),
            event_poll: Duration::from_millis(number("CIVIC_EVENT_POLL_MS", 2_000)?.max(100)),
            receipt_poll: Duration::from_millis(number("CIVIC_RECEIPT_POLL_MS", 1_000)?.max(10)),
            receipt_poll_attempts: u32::try_from(number("CIVIC_RECEIPT_POLL_ATTEMPTS", 120)?.max(1))
                .context("CIVIC_RECEIPT_POLL_ATTEMPTS is too large")?,
            http_bind: optional("CIVIC_HTTP_BIND").unwrap_or_else(|| DEFAULT_HTTP_BIND.to_string()),
        })
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn number(name: &str, default: u64) -> anyhow::Result<u64> {
    match optional(name) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{} must be a valid u64 (got '{}')", name, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the process-wide environment is not mutated concurrently.
    #[test]
    fn reads_defaults_and_overrides() {
        for key in [
            "CIVIC_WALLET_RPC_URL",
            "CIVIC_LEGACY_RPC_URL",
            "CIVIC_LOCAL_RPC_URL",
            "CIVIC_MANIFEST_PATH",
            "CIVIC_EVENT_POLL_MS",
            "CIVIC_RECEIPT_POLL_MS",
            "CIVIC_RECEIPT_POLL_ATTEMPTS",
            "CIVIC_HTTP_BIND",
        ] {
            std::env::remove_var(key);
        }

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.wallet_rpc_url, None);
        assert_eq!(config.local_rpc_url, DEFAULT_LOCAL_RPC_URL);
        assert_eq!(config.manifest_path, PathBuf::from(DEFAULT_MANIFEST_PATH));
        assert_eq!(config.event_poll, Duration::from_millis(2_000));
        assert_eq!(config.receipt_poll_attempts, 120);

        std::env::set_var("CIVIC_WALLET_RPC_URL", " http://127.0.0.1:8545 ");
        std::env::set_var("CIVIC_RECEIPT_POLL_ATTEMPTS", "3");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.wallet_rpc_url.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(config.receipt_poll_attempts, 3);

        std::env::set_var("CIVIC_EVENT_POLL_MS", "soon");
        assert!(ClientConfig::from_env().is_err());

        std::env::remove_var("CIVIC_WALLET_RPC_URL");
        std::env::remove_var("CIVIC_RECEIPT_POLL_ATTEMPTS");
        std::env::remove_var("CIVIC_EVENT_POLL_MS");
    }
}
