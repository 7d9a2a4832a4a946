//! Contract client speaking `eth_call` / `eth_sendTransaction` to a node or wallet endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::domain::contract::calls::{decode_bool, encode_registered_citizens};
use crate::domain::contract::{ContractCall, ContractClient, ContractHandle, TxReceipt};
use crate::domain::error::RpcError;
use crate::domain::types::{format_address, format_hash, parse_hash, Address, CitizenId};
use crate::infra::rpc::client::RpcTransport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptJson {
    transaction_hash: String,
    #[serde(default)]
    status: Option<String>,
}

pub struct RpcContractClient {
    transport: RpcTransport,
    receipt_poll: Duration,
    receipt_poll_attempts: u32,
}

impl RpcContractClient {
    pub fn new(url: impl Into<String>, receipt_poll: Duration, receipt_poll_attempts: u32) -> Self {
        Self {
            transport: RpcTransport::new(url),
            receipt_poll,
            receipt_poll_attempts,
        }
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RpcError> {
        for attempt in 1..=self.receipt_poll_attempts {
            let receipt: Option<ReceiptJson> = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(TxReceipt {
                    tx_hash: parse_hash(&receipt.transaction_hash)?,
                    status: receipt_succeeded(receipt.status.as_deref()),
                });
            }
            debug!(tx = tx_hash, attempt, "receipt not available yet");
            sleep(self.receipt_poll).await;
        }
        Err(RpcError::transport(format!(
            "no receipt for {} after {} attempts",
            tx_hash, self.receipt_poll_attempts
        )))
    }
}

/// Receipts carry `"0x1"` for success and `"0x0"` for a revert.
fn receipt_succeeded(status: Option<&str>) -> bool {
    matches!(status, Some("0x1") | Some("0x01") | Some("1"))
}

fn hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[async_trait]
impl ContractClient for RpcContractClient {
    async fn registered_citizens(
        &self,
        handle: &ContractHandle,
        citizen: CitizenId,
    ) -> Result<bool, RpcError> {
        let params = json!([
            {
                "to": format_address(&handle.address),
                "data": hex_data(&encode_registered_citizens(&citizen)),
            },
            "latest"
        ]);
        let raw: String = self.transport.request("eth_call", params).await?;
        let digits = raw.strip_prefix("0x").unwrap_or(&raw);
        let output = hex::decode(digits)
            .map_err(|e| RpcError::decode(format!("registeredCitizens output: {}", e)))?;
        decode_bool(&output)
            .ok_or_else(|| RpcError::decode(format!("registeredCitizens returned {}", raw)))
    }

    async fn send(
        &self,
        handle: &ContractHandle,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxReceipt, RpcError> {
        let params = json!([{
            "from": format_address(&from),
            "to": format_address(&handle.address),
            "data": hex_data(&call.encode()),
        }]);
        let tx_hash: String = self.transport.request("eth_sendTransaction", params).await?;
        info!(method = call.method(), tx = %tx_hash, "transaction sent, waiting for receipt");
        let receipt = self.wait_for_receipt(&tx_hash).await?;
        debug!(tx = %format_hash(&receipt.tx_hash), status = receipt.status, "receipt received");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_status_parsing() {
        assert!(receipt_succeeded(Some("0x1")));
        assert!(!receipt_succeeded(Some("0x0")));
        assert!(!receipt_succeeded(None));
    }
}
