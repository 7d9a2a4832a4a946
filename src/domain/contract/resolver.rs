//! Resolves which deployed contract to talk to on a given network.

use primitive_types::H160;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::domain::contract::{AbiDescriptor, ContractHandle};
use crate::domain::error::ResolveError;
use crate::domain::types::{format_address, parse_address, Address, NetworkId};

/// Address the contract is deployed at on the local development chain.
pub const LOCAL_DEV_ADDRESS: Address = H160([
    0xf7, 0xca, 0x9a, 0xe5, 0x6d, 0x32, 0xed, 0x69, 0x61, 0x60, 0x13, 0x54, 0x32, 0x92, 0x81, 0x24,
    0x03, 0x88, 0x8d, 0xce,
]);

/// Address used together with the registration-only interface.
pub const FALLBACK_ADDRESS: Address = H160([
    0xcf, 0xeb, 0x86, 0x9f, 0x69, 0x43, 0x1e, 0x42, 0xcd, 0xb5, 0x4a, 0x4f, 0x4f, 0x10, 0x5c, 0x19,
    0xc0, 0x80, 0xa6, 0x01,
]);

/// Build artifact layout: `{ "abi": [...], "networks": { "<id>": { "address": "0x.." } } }`.
#[derive(Debug, Deserialize)]
struct DeploymentManifest {
    abi: AbiDescriptor,
    #[serde(default)]
    networks: HashMap<String, NetworkDeployment>,
}

#[derive(Debug, Deserialize)]
struct NetworkDeployment {
    address: String,
}

/// Where the deployment manifest comes from.
#[derive(Clone, Debug)]
pub enum ManifestSource {
    File(PathBuf),
    Inline(String),
    Missing,
}

pub struct ContractResolver {
    source: ManifestSource,
}

impl ContractResolver {
    pub fn new(source: ManifestSource) -> Self {
        Self { source }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ManifestSource::File(path.into()))
    }

    /// Resolves a handle for `network`, never failing.
    ///
    /// Any manifest problem yields a degraded handle (registration-only interface at
    /// [`FALLBACK_ADDRESS`]) carrying the reason.
    pub async fn resolve(&self, network: NetworkId) -> ContractHandle {
        match self.lookup(network).await {
            Ok(handle) => {
                info!(
                    network = %network,
                    address = %format_address(&handle.address),
                    "contract resolved"
                );
                handle
            }
            Err(reason) => {
                warn!(
                    network = %network,
                    error = %reason,
                    "could not load contract from deployment manifest, using default ABI and address"
                );
                ContractHandle::degraded(network, FALLBACK_ADDRESS, reason)
            }
        }
    }

    /// Strict manifest lookup.
    pub async fn lookup(&self, network: NetworkId) -> Result<ContractHandle, ResolveError> {
        let manifest = self.load_manifest().await?;

        let address = if network.is_local_dev() {
            LOCAL_DEV_ADDRESS
        } else {
            let deployment = manifest
                .networks
                .get(&network.to_string())
                .ok_or(ResolveError::NoDeployment(network))?;
            parse_address(&deployment.address)
                .map_err(|e| ResolveError::InvalidAddress(e.message))?
        };

        Ok(ContractHandle::full(network, address, manifest.abi))
    }

    async fn load_manifest(&self) -> Result<DeploymentManifest, ResolveError> {
        let raw = match &self.source {
            ManifestSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ResolveError::ManifestMissing(format!("{}: {}", path.display(), e)))?,
            ManifestSource::Inline(raw) => raw.clone(),
            ManifestSource::Missing => {
                return Err(ResolveError::ManifestMissing(
                    "no deployment manifest configured".to_string(),
                ))
            }
        };
        serde_json::from_str(&raw).map_err(|e| ResolveError::ManifestInvalid(e.to_string()))
    }
}
