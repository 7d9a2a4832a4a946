//! Wallet provider backed by a JSON-RPC endpoint.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::contract::ContractClient;
use crate::domain::error::RpcError;
use crate::domain::provider::{ProviderKind, WalletProvider};
use crate::domain::types::{parse_address, Address, NetworkId, ProviderEvent};
use crate::infra::rpc::client::RpcTransport;
use crate::infra::rpc::contract::RpcContractClient;

const DEFAULT_RECEIPT_POLL: Duration = Duration::from_secs(1);
const DEFAULT_RECEIPT_POLL_ATTEMPTS: u32 = 120;

pub struct RpcWalletProvider {
    kind: ProviderKind,
    transport: RpcTransport,
    contract: Arc<RpcContractClient>,
    events: broadcast::Sender<ProviderEvent>,
    shutdown: Arc<Notify>,
}

impl RpcWalletProvider {
    pub fn new(kind: ProviderKind, url: impl Into<String>) -> Self {
        Self::with_receipt_polling(kind, url, DEFAULT_RECEIPT_POLL, DEFAULT_RECEIPT_POLL_ATTEMPTS)
    }

    /// Transactions sent through this provider wait `receipt_poll` between receipt lookups.
    pub fn with_receipt_polling(
        kind: ProviderKind,
        url: impl Into<String>,
        receipt_poll: Duration,
        receipt_poll_attempts: u32,
    ) -> Self {
        let url = url.into();
        let (events, _) = broadcast::channel(64);
        Self {
            kind,
            transport: RpcTransport::new(url.clone()),
            contract: Arc::new(RpcContractClient::new(url, receipt_poll, receipt_poll_attempts)),
            events,
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// Starts the background task that polls accounts and network id and broadcasts changes.
    ///
    /// The first poll only records the baseline. Poll failures are skipped.
    pub fn spawn_watcher(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let shutdown = self.shutdown.clone();
            let mut last_accounts: Option<Vec<Address>> = None;
            let mut last_network: Option<NetworkId> = None;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll_once(&mut last_accounts, &mut last_network).await;
                    }
                    _ = shutdown.notified() => {
                        info!(url = %self.url(), "provider watcher shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    async fn poll_once(
        &self,
        last_accounts: &mut Option<Vec<Address>>,
        last_network: &mut Option<NetworkId>,
    ) {
        match self.get_accounts().await {
            Ok(accounts) => {
                if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                    debug!(url = %self.url(), "accounts changed");
                    let _ = self.events.send(ProviderEvent::AccountsChanged(accounts.clone()));
                }
                *last_accounts = Some(accounts);
            }
            Err(e) => debug!(url = %self.url(), error = %e, "account poll failed"),
        }

        match self.network_id().await {
            Ok(network) => {
                if last_network.is_some_and(|prev| prev != network) {
                    debug!(url = %self.url(), network = %network, "network changed");
                    let _ = self.events.send(ProviderEvent::NetworkChanged(network));
                }
                *last_network = Some(network);
            }
            Err(e) => debug!(url = %self.url(), error = %e, "network poll failed"),
        }
    }
}

fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, RpcError> {
    raw.iter().map(|a| parse_address(a)).collect()
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        match self.kind {
            ProviderKind::Injected => {
                let raw: Vec<String> = self.transport.request("eth_requestAccounts", json!([])).await?;
                parse_accounts(raw)
            }
            ProviderKind::Legacy | ProviderKind::LocalFallback => self.get_accounts().await,
        }
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, RpcError> {
        let raw: Vec<String> = self.transport.request("eth_accounts", json!([])).await?;
        parse_accounts(raw)
    }

    async fn network_id(&self) -> Result<NetworkId, RpcError> {
        let raw: String = self.transport.request("net_version", json!([])).await?;
        raw.trim()
            .parse::<u64>()
            .map(NetworkId)
            .map_err(|e| RpcError::decode(format!("invalid network id '{}': {}", raw, e)))
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }

    fn contract_client(&self) -> Option<Arc<dyn ContractClient>> {
        Some(self.contract.clone())
    }
}
