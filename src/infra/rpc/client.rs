// JSON-RPC 2.0 over HTTP, shared by the wallet providers and the contract client.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::domain::error::RpcError;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct RpcTransport {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and decodes its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(url = %self.url, method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::transport(format!("{} {}: {}", method, self.url, e)))?;
        let decoded: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::transport(format!("{}: invalid JSON-RPC response: {}", method, e)))?;

        if let Some(err) = decoded.error {
            return Err(RpcError::new(err.code, err.message));
        }
        let result = decoded.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| RpcError::decode(format!("{}: unexpected result: {}", method, e)))
    }
}
