//! Resolved contract handles and the calls the client can make against them.

use async_trait::async_trait;
use primitive_types::H256;
use serde::{Deserialize, Serialize};

use crate::domain::error::{ResolveError, RpcError};
use crate::domain::types::{Address, CitizenId, NetworkId};

pub mod calls;
pub mod resolver;

pub use calls::ContractCall;
pub use resolver::{ContractResolver, ManifestSource, FALLBACK_ADDRESS, LOCAL_DEV_ADDRESS};

/// One parameter of an ABI entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One entry of a compiled contract ABI (function, event, constructor...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: Option<String>,
}

fn default_entry_type() -> String {
    "function".to_string()
}

/// The interface description of a deployed contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbiDescriptor(pub Vec<AbiEntry>);

impl AbiDescriptor {
    /// Whether the ABI declares a function with this name.
    pub fn declares(&self, method: &str) -> bool {
        self.0
            .iter()
            .any(|e| e.entry_type == "function" && e.name.as_deref() == Some(method))
    }

    pub fn function_names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|e| e.entry_type == "function")
            .filter_map(|e| e.name.clone())
            .collect()
    }

    /// Registration-only interface used when deployment metadata is unavailable.
    pub fn registration_only() -> Self {
        let bytes32 = |name: &str| AbiParam {
            name: name.to_string(),
            kind: "bytes32".to_string(),
        };
        Self(vec![
            AbiEntry {
                name: Some(calls::REGISTER_CITIZEN.to_string()),
                entry_type: "function".to_string(),
                inputs: vec![bytes32("citizenHash")],
                outputs: Vec::new(),
                state_mutability: Some("nonpayable".to_string()),
            },
            AbiEntry {
                name: Some(calls::REGISTERED_CITIZENS.to_string()),
                entry_type: "function".to_string(),
                inputs: vec![bytes32("")],
                outputs: vec![AbiParam {
                    name: String::new(),
                    kind: "bool".to_string(),
                }],
                state_mutability: Some("view".to_string()),
            },
        ])
    }
}

/// Which interface a handle was resolved with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractInterface {
    /// ABI taken from the deployment manifest.
    Full(AbiDescriptor),
    /// Hard-coded registration-only ABI; `reason` records why the manifest was not usable.
    Degraded {
        abi: AbiDescriptor,
        reason: ResolveError,
    },
}

/// An (address, interface) pair resolved for one network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractHandle {
    pub network: NetworkId,
    pub address: Address,
    pub interface: ContractInterface,
}

impl ContractHandle {
    pub fn full(network: NetworkId, address: Address, abi: AbiDescriptor) -> Self {
        Self {
            network,
            address,
            interface: ContractInterface::Full(abi),
        }
    }

    pub fn degraded(network: NetworkId, address: Address, reason: ResolveError) -> Self {
        Self {
            network,
            address,
            interface: ContractInterface::Degraded {
                abi: AbiDescriptor::registration_only(),
                reason,
            },
        }
    }

    pub fn abi(&self) -> &AbiDescriptor {
        match &self.interface {
            ContractInterface::Full(abi) => abi,
            ContractInterface::Degraded { abi, .. } => abi,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.interface, ContractInterface::Degraded { .. })
    }

    pub fn degraded_reason(&self) -> Option<&ResolveError> {
        match &self.interface {
            ContractInterface::Full(_) => None,
            ContractInterface::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn supports(&self, method: &str) -> bool {
        self.abi().declares(method)
    }
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    /// `true` when the transaction executed without reverting.
    pub status: bool,
}

/// Read and write access to the deployed civic contract.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// `registeredCitizens(identifier)`: read-only registration lookup.
    async fn registered_citizens(
        &self,
        handle: &ContractHandle,
        citizen: CitizenId,
    ) -> Result<bool, RpcError>;

    /// Sends a state-changing call from `from` and waits for its receipt.
    async fn send(
        &self,
        handle: &ContractHandle,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, RpcError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_handle_only_supports_registration() {
        let handle = ContractHandle::degraded(
            NetworkId(42),
            FALLBACK_ADDRESS,
            ResolveError::NoDeployment(NetworkId(42)),
        );
        assert!(handle.is_degraded());
        assert!(handle.supports(calls::REGISTER_CITIZEN));
        assert!(handle.supports(calls::REGISTERED_CITIZENS));
        assert!(!handle.supports(calls::VOTE));
        assert!(!handle.supports(calls::CREATE_PROPOSAL));
        assert!(!handle.supports(calls::REPORT_ISSUE));
    }

    #[test]
    fn abi_entries_parse_from_truffle_json() {
        let abi: AbiDescriptor = serde_json::from_str(
            r#"[
                {"type":"constructor","inputs":[]},
                {"name":"vote","type":"function","inputs":[
                    {"name":"proposalId","type":"uint256"},
                    {"name":"support","type":"bool"},
                    {"name":"citizenHash","type":"bytes32"}
                ],"outputs":[],"stateMutability":"nonpayable"},
                {"name":"Voted","type":"event","inputs":[]}
            ]"#,
        )
        .unwrap();
        assert!(abi.declares("vote"));
        assert!(!abi.declares("Voted"));
        assert_eq!(abi.function_names(), vec!["vote".to_string()]);
    }
}
