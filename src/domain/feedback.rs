//! Seams to the user-facing side of the client: status messages and data reloads.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Severity of a transient status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Receives short-lived status messages for the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Category of on-chain data shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataScope {
    Proposals,
    Issues,
}

/// Reloads a category of on-chain data after it may have changed.
#[async_trait]
pub trait DataRefresher: Send + Sync {
    async fn load(&self, scope: DataScope) -> anyhow::Result<()>;
}
