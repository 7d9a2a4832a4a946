//! The civic client session.
//!
//! `CivicApp` owns the [`Session`] and drives the whole pipeline:
//! 1.  Binding a wallet provider and resolving the contract for its network.
//! 2.  Deriving the citizen identifier and running the registration gate on connect.
//! 3.  Submitting votes, proposals and issue reports for the registered citizen.
//! 4.  Reacting to account / network changes pushed by the wallet.
//!
//! Every public flow takes `&mut self`, so flows never interleave on one app. Callers that
//! share the app (HTTP handlers, the event pump) go through a `tokio::sync::Mutex`; readers
//! that must not wait for a flow use [`CivicApp::watch_snapshot`].
//!
//! Each successful provider binding hands a fresh event subscription to the pump, and each
//! reset detaches it, so the pump follows whatever provider is bound for the app's lifetime.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::actions::{Action, ActionSubmitter};
use crate::domain::contract::{ContractClient, ContractHandle, ContractResolver};
use crate::domain::error::{ConnectError, RpcError, SubmitError};
use crate::domain::feedback::{DataRefresher, DataScope, NotificationSink, Severity};
use crate::domain::provider::{ProviderBinding, ProviderKind};
use crate::domain::registration::{GateContext, GateState, RegistrationGate, RegistrationPrompt};
use crate::domain::session::Session;
use crate::domain::types::{
    format_address, format_hash, short_address, Address, NetworkId, ProviderEvent,
};

pub const PROVIDER_FAILED_MESSAGE: &str = "Failed to connect to Web3 provider";
pub const CONNECTION_REJECTED_MESSAGE: &str = "Connection was rejected";
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet";

/// Event stream of the currently bound provider; `None` once the binding is reset.
type Subscription = Option<broadcast::Receiver<ProviderEvent>>;

/// Serializable view of the session for front ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub provider: Option<ProviderKind>,
    pub account: Option<String>,
    /// Short account label, present once the citizen is registered.
    pub connected_as: Option<String>,
    pub network_id: Option<NetworkId>,
    pub citizen_id: Option<String>,
    pub registration: GateState,
    pub contract: Option<ContractSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContractSnapshot {
    pub address: String,
    pub degraded: bool,
    pub degraded_reason: Option<String>,
    pub methods: Vec<String>,
}

impl SessionSnapshot {
    fn empty() -> Self {
        Self {
            provider: None,
            account: None,
            connected_as: None,
            network_id: None,
            citizen_id: None,
            registration: GateState::Unchecked,
            contract: None,
        }
    }
}

impl From<&ContractHandle> for ContractSnapshot {
    fn from(handle: &ContractHandle) -> Self {
        Self {
            address: format_address(&handle.address),
            degraded: handle.is_degraded(),
            degraded_reason: handle.degraded_reason().map(|r| r.to_string()),
            methods: handle.abi().function_names(),
        }
    }
}

pub struct CivicApp {
    binding: ProviderBinding,
    resolver: ContractResolver,
    contract: Arc<dyn ContractClient>,
    sink: Arc<dyn NotificationSink>,
    refresher: Arc<dyn DataRefresher>,
    session: Session,
    gate: RegistrationGate,
    subscriptions: mpsc::UnboundedSender<Subscription>,
    pending_pump: Option<mpsc::UnboundedReceiver<Subscription>>,
    published: watch::Sender<SessionSnapshot>,
}

impl CivicApp {
    pub fn new(
        binding: ProviderBinding,
        resolver: ContractResolver,
        // used when the bound provider has no contract client of its own
        contract: Arc<dyn ContractClient>,
        sink: Arc<dyn NotificationSink>,
        refresher: Arc<dyn DataRefresher>,
    ) -> Self {
        let (subscriptions, pending_pump) = mpsc::unbounded_channel();
        let app = Self {
            binding,
            resolver,
            contract,
            sink,
            refresher,
            session: Session::default(),
            gate: RegistrationGate::new(),
            subscriptions,
            pending_pump: Some(pending_pump),
            published: watch::channel(SessionSnapshot::empty()).0,
        };
        app.publish();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registration_state(&self) -> GateState {
        self.gate.state()
    }

    /// Snapshot as of the end of the last flow, readable while a flow holds the app.
    pub fn watch_snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.published.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let registered = self.gate.state() == GateState::Registered;
        SessionSnapshot {
            provider: self.binding.active_kind(),
            account: self.session.account().as_ref().map(format_address),
            connected_as: self
                .session
                .account()
                .filter(|_| registered)
                .as_ref()
                .map(short_address),
            network_id: self.session.network(),
            citizen_id: self.session.citizen().as_ref().map(format_hash),
            registration: self.gate.state(),
            contract: self.session.contract().map(ContractSnapshot::from),
        }
    }

    /// Binds a provider, resolves the contract and loads data for the bound account.
    pub async fn init(&mut self) -> Result<(), ConnectError> {
        let result = self.try_init().await;
        self.publish();
        result
    }

    async fn try_init(&mut self) -> Result<(), ConnectError> {
        let account = match self.bind_provider().await {
            Ok(account) => account,
            Err(e) => {
                error!(error = %e, "error initializing wallet provider");
                self.sink.notify(PROVIDER_FAILED_MESSAGE, Severity::Error);
                return Err(e);
            }
        };
        self.ensure_contract().await?;
        self.load_all().await;
        info!(account = %format_address(&account), "app initialized");
        Ok(())
    }

    /// Establishes the citizen identity for the wallet account, registering it on first use.
    ///
    /// Returns the connected account. On failure the user is notified; a declined or failed
    /// registration leaves the identifier in the session but no data is loaded.
    pub async fn connect_wallet(
        &mut self,
        prompt: &dyn RegistrationPrompt,
    ) -> Result<Address, ConnectError> {
        let result = self.try_connect(prompt).await;
        self.publish();
        match result {
            Ok(account) => Ok(account),
            Err(e) => {
                error!(error = %e, "connection failed");
                let message = if e.is_rejection() {
                    CONNECTION_REJECTED_MESSAGE
                } else {
                    CONNECT_FAILED_MESSAGE
                };
                self.sink.notify(message, Severity::Error);
                Err(e)
            }
        }
    }

    async fn try_connect(&mut self, prompt: &dyn RegistrationPrompt) -> Result<Address, ConnectError> {
        let account = match self.session.account() {
            Some(account) => account,
            None => match self.bind_provider().await {
                Ok(account) => account,
                Err(e) => {
                    error!(error = %e, "error initializing wallet provider");
                    self.sink.notify(PROVIDER_FAILED_MESSAGE, Severity::Error);
                    return Err(e);
                }
            },
        };
        let handle = self.ensure_contract().await?;
        let citizen = self
            .session
            .bind_identity()
            .ok_or_else(|| ConnectError::ProviderUnavailable("no account bound".to_string()))?;

        self.gate = RegistrationGate::new();
        let contract = self.contract_client();
        let ctx = GateContext {
            contract: contract.as_ref(),
            handle: &handle,
            account,
            citizen,
        };
        self.gate.run(ctx, prompt, self.sink.as_ref()).await?;

        info!(
            account = %format_address(&account),
            citizen = %format_hash(&citizen),
            "wallet connected"
        );
        self.load_all().await;
        Ok(account)
    }

    pub async fn vote(&mut self, proposal_id: u64, choice: bool) -> Result<(), SubmitError> {
        self.submit(Action::Vote {
            proposal_id,
            choice,
        })
        .await
    }

    pub async fn create_proposal(
        &mut self,
        title: String,
        description: String,
        duration_seconds: u64,
    ) -> Result<(), SubmitError> {
        self.submit(Action::CreateProposal {
            title,
            description,
            duration_seconds,
        })
        .await
    }

    pub async fn report_issue(
        &mut self,
        category: String,
        description: String,
        location: String,
    ) -> Result<(), SubmitError> {
        self.submit(Action::ReportIssue {
            category,
            description,
            location,
        })
        .await
    }

    pub async fn submit(&mut self, action: Action) -> Result<(), SubmitError> {
        if self.session.citizen().is_some() {
            if let Err(e) = self.ensure_contract().await {
                warn!(error = %e, "could not resolve contract before submission");
            }
        }
        let contract = self.contract_client();
        let result = ActionSubmitter::new(
            contract.as_ref(),
            self.refresher.as_ref(),
            self.sink.as_ref(),
        )
        .submit(&self.session, action)
        .await;
        self.publish();
        result
    }

    /// The single path through which wallet events mutate the session.
    pub async fn handle_event(&mut self, event: ProviderEvent) {
        self.binding.observe(&event);
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let account = accounts.first().copied();
                info!(account = ?account.as_ref().map(format_address), "accounts changed");
                self.session.apply_account_change(account);
                self.gate = RegistrationGate::new();
                if account.is_some() {
                    self.load_all().await;
                }
            }
            ProviderEvent::NetworkChanged(network) => {
                warn!(network = %network, "network changed, resynchronizing session");
                self.resync().await;
            }
        }
        self.publish();
    }

    /// Drops all session state and starts over, as after a page reload.
    pub async fn resync(&mut self) {
        self.binding.reset();
        self.detach_events();
        self.session.clear();
        self.gate = RegistrationGate::new();
        if let Err(e) = self.init().await {
            error!(error = %e, "resynchronization failed");
        }
    }

    /// Network id reported by the bound provider right now.
    pub async fn probe_network(&self) -> Result<NetworkId, RpcError> {
        self.binding.probe_network().await
    }

    /// Feeds wallet events into `handle_event` for the lifetime of the app.
    ///
    /// The pump follows the binding: it switches to the new provider's stream after every
    /// successful bind and idles while nothing is bound. Returns `None` if a pump is
    /// already running for this app.
    pub async fn spawn_event_pump(app: Arc<Mutex<CivicApp>>) -> Option<JoinHandle<()>> {
        let mut subscriptions = app.lock().await.pending_pump.take()?;
        Some(tokio::spawn(async move {
            let mut current: Subscription = None;
            loop {
                tokio::select! {
                    // a rebind sent during the last event must win over the stale stream
                    biased;
                    next = subscriptions.recv() => match next {
                        Some(subscription) => {
                            debug!(attached = subscription.is_some(), "event pump switched stream");
                            current = subscription;
                        }
                        None => break,
                    },
                    event = next_event(&mut current) => match event {
                        Ok(event) => app.lock().await.handle_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event pump lagged behind provider events");
                        }
                        Err(RecvError::Closed) => {
                            warn!("provider event stream closed, waiting for a new binding");
                            current = None;
                        }
                    },
                }
            }
        }))
    }

    fn attach_events(&self) {
        // a closed channel only means the app is being dropped
        let _ = self.subscriptions.send(self.binding.subscribe());
    }

    fn detach_events(&self) {
        let _ = self.subscriptions.send(None);
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.published.send_replace(snapshot);
    }

    /// The bound provider's contract client, or the default one.
    fn contract_client(&self) -> Arc<dyn ContractClient> {
        self.binding
            .contract_client()
            .unwrap_or_else(|| self.contract.clone())
    }

    async fn bind_provider(&mut self) -> Result<Address, ConnectError> {
        let account = self.binding.connect().await?;
        self.attach_events();
        let network = self
            .binding
            .current_network()
            .ok_or_else(|| ConnectError::ProviderUnavailable("provider reported no network".to_string()))?;
        self.session.bind_account(account, network);
        Ok(account)
    }

    /// Returns the handle for the current network, resolving it if missing or stale.
    async fn ensure_contract(&mut self) -> Result<ContractHandle, ConnectError> {
        if let Some(handle) = self.session.current_contract() {
            return Ok(handle.clone());
        }
        let network = self
            .session
            .network()
            .ok_or_else(|| ConnectError::ProviderUnavailable("no network bound".to_string()))?;
        let handle = self.resolver.resolve(network).await;
        self.session.set_contract(handle.clone());
        Ok(handle)
    }

    async fn load_all(&self) {
        for scope in [DataScope::Proposals, DataScope::Issues] {
            if let Err(e) = self.refresher.load(scope).await {
                warn!(?scope, error = %e, "data load failed");
            }
        }
    }
}

async fn next_event(current: &mut Subscription) -> Result<ProviderEvent, RecvError> {
    match current {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
