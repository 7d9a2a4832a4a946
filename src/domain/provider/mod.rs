//! Wallet providers and the binding that picks one of them.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::contract::ContractClient;
use crate::domain::error::RpcError;
use crate::domain::types::{Address, NetworkId, ProviderEvent};

pub mod binding;

pub use binding::ProviderBinding;

/// The kind of wallet connection, in the order the binding tries them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Modern wallet that requires the user to authorize account access.
    Injected,
    /// Legacy wallet exposing its accounts without a prompt.
    Legacy,
    /// Local development node.
    LocalFallback,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Asks the user to expose their accounts. Providers without an authorization step
    /// just return their accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.get_accounts().await
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, RpcError>;

    async fn network_id(&self) -> Result<NetworkId, RpcError>;

    /// Account and network change notifications, if the provider emits them.
    fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>>;

    /// Contract client that sends transactions through this provider, if it has one.
    fn contract_client(&self) -> Option<Arc<dyn ContractClient>> {
        None
    }
}
