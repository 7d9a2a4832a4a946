//! JSON-RPC implementations of the wallet provider and contract client.

use std::sync::Arc;

use crate::domain::provider::ProviderKind;
use crate::infra::config::ClientConfig;

pub mod client;
pub mod contract;
pub mod provider;

pub use client::RpcTransport;
pub use contract::RpcContractClient;
pub use provider::RpcWalletProvider;

/// Provider candidates in binding order: authorizing wallet, legacy wallet, local node.
///
/// Each candidate sends its contract transactions to its own endpoint.
pub fn wallet_candidates(config: &ClientConfig) -> Vec<Arc<RpcWalletProvider>> {
    let endpoints = [
        (ProviderKind::Injected, config.wallet_rpc_url.clone()),
        (ProviderKind::Legacy, config.legacy_rpc_url.clone()),
        (ProviderKind::LocalFallback, Some(config.local_rpc_url.clone())),
    ];
    endpoints
        .into_iter()
        .filter_map(|(kind, url)| {
            url.map(|url| {
                Arc::new(RpcWalletProvider::with_receipt_polling(
                    kind,
                    url,
                    config.receipt_poll,
                    config.receipt_poll_attempts,
                ))
            })
        })
        .collect()
}

/// Client against the local node, used until a provider is bound.
pub fn contract_client(config: &ClientConfig) -> RpcContractClient {
    RpcContractClient::new(
        config.local_rpc_url.clone(),
        config.receipt_poll,
        config.receipt_poll_attempts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::WalletProvider;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(wallet: Option<&str>) -> ClientConfig {
        ClientConfig {
            wallet_rpc_url: wallet.map(str::to_string),
            legacy_rpc_url: None,
            local_rpc_url: "http://127.0.0.1:7545".to_string(),
            manifest_path: PathBuf::from("build/contracts/Civics.json"),
            event_poll: Duration::from_millis(2_000),
            receipt_poll: Duration::from_millis(1_000),
            receipt_poll_attempts: 120,
            http_bind: "127.0.0.1:0".to_string(),
        }
    }

    #[test]
    fn local_node_is_always_the_last_candidate() {
        let kinds: Vec<_> = wallet_candidates(&config(Some("http://127.0.0.1:8545")))
            .iter()
            .map(|p| p.kind())
            .collect();
        assert_eq!(kinds, vec![ProviderKind::Injected, ProviderKind::LocalFallback]);

        let only_local = wallet_candidates(&config(None));
        assert_eq!(only_local.len(), 1);
        assert_eq!(only_local[0].url(), "http://127.0.0.1:7545");
        assert!(only_local[0].contract_client().is_some());
    }
}
