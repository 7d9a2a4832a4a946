//! Discovers a usable wallet connection and tracks its account / network.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::contract::ContractClient;
use crate::domain::error::{ConnectError, RpcError};
use crate::domain::provider::{ProviderKind, WalletProvider};
use crate::domain::types::{format_address, Address, NetworkId, ProviderEvent};

/// Wraps the first candidate provider that yields an account.
pub struct ProviderBinding {
    candidates: Vec<Arc<dyn WalletProvider>>,
    active: Option<Arc<dyn WalletProvider>>,
    account: Option<Address>,
    network: Option<NetworkId>,
}

impl ProviderBinding {
    /// `candidates` are tried in order; put the injected wallet first and the local node last.
    pub fn new(candidates: Vec<Arc<dyn WalletProvider>>) -> Self {
        Self {
            candidates,
            active: None,
            account: None,
            network: None,
        }
    }

    /// Binds to the first candidate with a non-empty account list.
    ///
    /// A user rejection from a provider that asks for authorization aborts immediately with
    /// [`ConnectError::UserDeclined`]; any other candidate failure moves on to the next one.
    /// On error nothing is bound.
    pub async fn connect(&mut self) -> Result<Address, ConnectError> {
        let mut failures = Vec::new();

        for provider in &self.candidates {
            let kind = provider.kind();
            let accounts = match kind {
                ProviderKind::Injected => provider.request_accounts().await,
                ProviderKind::Legacy | ProviderKind::LocalFallback => provider.get_accounts().await,
            };

            let account = match accounts {
                Ok(list) => match list.first() {
                    Some(a) => *a,
                    None => {
                        debug!(?kind, "provider exposes no accounts");
                        failures.push(format!("{:?}: no accounts", kind));
                        continue;
                    }
                },
                Err(e) if e.is_user_rejection() && kind == ProviderKind::Injected => {
                    warn!(?kind, error = %e, "account access rejected by user");
                    return Err(ConnectError::UserDeclined);
                }
                Err(e) => {
                    debug!(?kind, error = %e, "provider unavailable");
                    failures.push(format!("{:?}: {}", kind, e.message));
                    continue;
                }
            };

            let network = match provider.network_id().await {
                Ok(n) => n,
                Err(e) => {
                    warn!(?kind, error = %e, "provider returned accounts but no network id");
                    failures.push(format!("{:?}: {}", kind, e.message));
                    continue;
                }
            };

            info!(
                ?kind,
                account = %format_address(&account),
                network = %network,
                "wallet provider bound"
            );
            self.active = Some(provider.clone());
            self.account = Some(account);
            self.network = Some(network);
            return Ok(account);
        }

        Err(ConnectError::ProviderUnavailable(if failures.is_empty() {
            "no provider candidates configured".to_string()
        } else {
            failures.join("; ")
        }))
    }

    pub fn current_account(&self) -> Option<Address> {
        self.account
    }

    pub fn current_network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn active_kind(&self) -> Option<ProviderKind> {
        self.active.as_ref().map(|p| p.kind())
    }

    pub fn is_bound(&self) -> bool {
        self.active.is_some()
    }

    /// Asks the bound provider for its current network id.
    pub async fn probe_network(&self) -> Result<NetworkId, RpcError> {
        match &self.active {
            Some(provider) => provider.network_id().await,
            None => Err(RpcError::transport("no wallet provider bound")),
        }
    }

    /// Contract client of the bound provider.
    pub fn contract_client(&self) -> Option<Arc<dyn ContractClient>> {
        self.active.as_ref().and_then(|p| p.contract_client())
    }

    /// Raw event stream of the bound provider.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.active.as_ref().and_then(|p| p.subscribe())
    }

    /// Runs `handler` with the new primary account each time the accounts change.
    pub fn on_account_change<F>(&self, handler: F) -> Option<JoinHandle<()>>
    where
        F: Fn(Option<Address>) + Send + 'static,
    {
        let rx = self.subscribe()?;
        Some(spawn_filtered(rx, move |event| {
            if let ProviderEvent::AccountsChanged(accounts) = event {
                handler(accounts.first().copied());
            }
        }))
    }

    /// Runs `handler` with the new network id each time the network changes.
    pub fn on_network_change<F>(&self, handler: F) -> Option<JoinHandle<()>>
    where
        F: Fn(NetworkId) + Send + 'static,
    {
        let rx = self.subscribe()?;
        Some(spawn_filtered(rx, move |event| {
            if let ProviderEvent::NetworkChanged(network) = event {
                handler(network);
            }
        }))
    }

    /// Applies an event to the tracked account / network.
    pub fn observe(&mut self, event: &ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.account = accounts.first().copied(),
            ProviderEvent::NetworkChanged(network) => self.network = Some(*network),
        }
    }

    /// Forgets the bound provider so the next `connect` starts from scratch.
    pub fn reset(&mut self) {
        self.active = None;
        self.account = None;
        self.network = None;
    }
}

fn spawn_filtered<F>(mut rx: broadcast::Receiver<ProviderEvent>, handle: F) -> JoinHandle<()>
where
    F: Fn(ProviderEvent) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => handle(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "provider event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
