//! In-memory wallet, ledger and feedback doubles for exercising the session flows without
//! a node.

use async_trait::async_trait;
use primitive_types::H256;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::domain::contract::calls;
use crate::domain::contract::{
    AbiDescriptor, AbiEntry, ContractCall, ContractClient, ContractHandle, TxReceipt,
};
use crate::domain::error::RpcError;
use crate::domain::feedback::{NotificationSink, Severity};
use crate::domain::provider::{ProviderKind, WalletProvider};
use crate::domain::registration::RegistrationPrompt;
use crate::domain::types::{Address, CitizenId, NetworkId, ProviderEvent};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// ABI declaring every method the civic contract exposes.
pub fn civic_abi() -> AbiDescriptor {
    let entry = |name: &str| AbiEntry {
        name: Some(name.to_string()),
        entry_type: "function".to_string(),
        inputs: Vec::new(),
        outputs: Vec::new(),
        state_mutability: None,
    };
    AbiDescriptor(vec![
        entry(calls::REGISTERED_CITIZENS),
        entry(calls::REGISTER_CITIZEN),
        entry(calls::VOTE),
        entry(calls::CREATE_PROPOSAL),
        entry(calls::REPORT_ISSUE),
    ])
}

pub fn full_handle(network: NetworkId, address: Address) -> ContractHandle {
    ContractHandle::full(network, address, civic_abi())
}

/// Deployment manifest JSON with the full civic ABI and the given network entries.
pub fn manifest_json(networks: &[(NetworkId, Address)]) -> String {
    let entries: serde_json::Map<String, serde_json::Value> = networks
        .iter()
        .map(|(network, address)| {
            (
                network.to_string(),
                serde_json::json!({ "address": crate::domain::types::format_address(address) }),
            )
        })
        .collect();
    serde_json::json!({
        "contractName": "Civics",
        "abi": civic_abi(),
        "networks": entries,
    })
    .to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WalletBehaviour {
    Normal,
    Rejecting,
    Unreachable,
}

/// A wallet whose accounts and network are switched by the test.
pub struct MockWallet {
    kind: ProviderKind,
    behaviour: WalletBehaviour,
    state: Mutex<(Vec<Address>, NetworkId)>,
    events: broadcast::Sender<ProviderEvent>,
    authorization_requests: AtomicUsize,
}

impl MockWallet {
    fn build(kind: ProviderKind, behaviour: WalletBehaviour, accounts: Vec<Address>, network: NetworkId) -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            kind,
            behaviour,
            state: Mutex::new((accounts, network)),
            events,
            authorization_requests: AtomicUsize::new(0),
        })
    }

    pub fn new(kind: ProviderKind, accounts: Vec<Address>, network: NetworkId) -> Arc<Self> {
        Self::build(kind, WalletBehaviour::Normal, accounts, network)
    }

    /// A wallet whose user rejects every authorization request.
    pub fn rejecting(kind: ProviderKind) -> Arc<Self> {
        Self::build(kind, WalletBehaviour::Rejecting, vec![Address::repeat_byte(0xee)], NetworkId(1))
    }

    /// A wallet that cannot be reached at all.
    pub fn unreachable(kind: ProviderKind) -> Arc<Self> {
        Self::build(kind, WalletBehaviour::Unreachable, Vec::new(), NetworkId(1))
    }

    pub fn authorization_requests(&self) -> usize {
        self.authorization_requests.load(Ordering::SeqCst)
    }

    /// Switches accounts and emits `AccountsChanged`.
    pub fn switch_account(&self, accounts: Vec<Address>) {
        lock(&self.state).0 = accounts.clone();
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    /// Switches network and emits `NetworkChanged`.
    pub fn switch_network(&self, network: NetworkId) {
        lock(&self.state).1 = network;
        let _ = self.events.send(ProviderEvent::NetworkChanged(network));
    }

    fn reachable(&self) -> Result<(), RpcError> {
        match self.behaviour {
            WalletBehaviour::Unreachable => Err(RpcError::transport("connection refused")),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.authorization_requests.fetch_add(1, Ordering::SeqCst);
        self.reachable()?;
        if self.behaviour == WalletBehaviour::Rejecting {
            return Err(RpcError::new(
                RpcError::USER_REJECTED,
                "User rejected the request.",
            ));
        }
        Ok(lock(&self.state).0.clone())
    }

    async fn get_accounts(&self) -> Result<Vec<Address>, RpcError> {
        self.reachable()?;
        Ok(lock(&self.state).0.clone())
    }

    async fn network_id(&self) -> Result<NetworkId, RpcError> {
        self.reachable()?;
        Ok(lock(&self.state).1)
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }
}

/// A state-changing call as seen by [`MockLedger`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSend {
    pub network: NetworkId,
    pub contract: Address,
    pub from: Address,
    pub call: ContractCall,
}

#[derive(Default)]
struct LedgerState {
    registered: HashSet<CitizenId>,
    votes: HashSet<(u64, CitizenId)>,
    sends: Vec<RecordedSend>,
    reads: usize,
    failed_receipts: bool,
    send_error: Option<RpcError>,
    read_error: Option<RpcError>,
}

/// A contract that keeps registrations and votes in memory and counts every call.
///
/// Duplicate votes revert the way the deployed contract does.
#[derive(Default)]
pub struct MockLedger {
    inner: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_registered(&self, citizen: CitizenId) {
        lock(&self.inner).registered.insert(citizen);
    }

    pub fn is_registered(&self, citizen: &CitizenId) -> bool {
        lock(&self.inner).registered.contains(citizen)
    }

    /// Mined transactions report `status` (false = reverted).
    pub fn set_receipt_status(&self, status: bool) {
        lock(&self.inner).failed_receipts = !status;
    }

    pub fn fail_sends(&self, error: RpcError) {
        lock(&self.inner).send_error = Some(error);
    }

    pub fn fail_reads(&self, error: RpcError) {
        lock(&self.inner).read_error = Some(error);
    }

    pub fn sends(&self) -> Vec<RecordedSend> {
        lock(&self.inner).sends.clone()
    }

    pub fn registration_submissions(&self) -> usize {
        lock(&self.inner)
            .sends
            .iter()
            .filter(|s| matches!(s.call, ContractCall::RegisterCitizen { .. }))
            .count()
    }

    pub fn reads(&self) -> usize {
        lock(&self.inner).reads
    }

    pub fn total_calls(&self) -> usize {
        let state = lock(&self.inner);
        state.reads + state.sends.len()
    }
}

#[async_trait]
impl ContractClient for MockLedger {
    async fn registered_citizens(
        &self,
        _handle: &ContractHandle,
        citizen: CitizenId,
    ) -> Result<bool, RpcError> {
        let mut state = lock(&self.inner);
        state.reads += 1;
        if let Some(e) = &state.read_error {
            return Err(e.clone());
        }
        Ok(state.registered.contains(&citizen))
    }

    async fn send(
        &self,
        handle: &ContractHandle,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, RpcError> {
        let mut state = lock(&self.inner);
        state.sends.push(RecordedSend {
            network: handle.network,
            contract: handle.address,
            from,
            call: call.clone(),
        });
        let tx_hash = H256::from_low_u64_be(state.sends.len() as u64);
        if let Some(e) = &state.send_error {
            return Err(e.clone());
        }
        if state.failed_receipts {
            return Ok(TxReceipt {
                tx_hash,
                status: false,
            });
        }
        match call {
            ContractCall::RegisterCitizen { citizen } => {
                state.registered.insert(*citizen);
            }
            ContractCall::Vote {
                proposal_id,
                citizen,
                ..
            } => {
                if !state.votes.insert((*proposal_id, *citizen)) {
                    return Err(RpcError::new(
                        -32000,
                        "VM Exception while processing transaction: revert Already voted",
                    ));
                }
            }
            ContractCall::CreateProposal { .. } | ContractCall::ReportIssue { .. } => {}
        }
        Ok(TxReceipt {
            tx_hash,
            status: true,
        })
    }
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, Severity)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        lock(&self.entries).clone()
    }

    pub fn contains(&self, message: &str) -> bool {
        lock(&self.entries).iter().any(|(m, _)| m == message)
    }

    pub fn count(&self, severity: Severity) -> usize {
        lock(&self.entries).iter().filter(|(_, s)| *s == severity).count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: Severity) {
        lock(&self.entries).push((message.to_string(), severity));
    }
}

/// A registration prompt with a fixed answer that counts how often it was shown.
pub struct ScriptedPrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistrationPrompt for ScriptedPrompt {
    async fn confirm(&self, _message: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
