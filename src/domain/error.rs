//! Error taxonomy for the session, registration and submission flows.

use thiserror::Error;

use crate::domain::types::NetworkId;

/// Stable, machine-readable code for an error variant.
pub trait ErrorCode {
    fn code(&self) -> &'static str;
}

/// An error returned by a wallet provider or node over JSON-RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// EIP-1193 "User Rejected Request".
    pub const USER_REJECTED: i64 = 4001;
    /// The endpoint could not be reached or answered with something other than JSON-RPC.
    pub const TRANSPORT: i64 = -32099;
    /// The response was well-formed JSON-RPC but its payload could not be decoded.
    pub const DECODE: i64 = -32098;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(Self::TRANSPORT, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(Self::DECODE, message)
    }

    /// True when the user dismissed or denied the request in their wallet.
    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
            || self.message.contains("User denied")
            || self.message.contains("User rejected")
    }
}

/// Failure to establish a wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No candidate provider produced a non-empty account list.
    #[error("No wallet provider or network endpoint is available: {0}")]
    ProviderUnavailable(String),
    /// The user rejected the account authorization request.
    #[error("Connection was rejected by the user")]
    UserDeclined,
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl ConnectError {
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::UserDeclined => true,
            Self::Registration(e) => e.is_rejection(),
            Self::ProviderUnavailable(_) => false,
        }
    }
}

impl ErrorCode for ConnectError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Self::UserDeclined => "USER_DECLINED",
            Self::Registration(e) => e.code(),
        }
    }
}

/// Contract deployment metadata could not be resolved. Never fatal: the resolver falls back
/// to the registration-only interface and keeps the reason on the degraded handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Deployment manifest unavailable: {0}")]
    ManifestMissing(String),
    #[error("Deployment manifest could not be parsed: {0}")]
    ManifestInvalid(String),
    #[error("No contract deployed on network {0}")]
    NoDeployment(NetworkId),
    #[error("Deployment address is invalid: {0}")]
    InvalidAddress(String),
}

impl ErrorCode for ResolveError {
    fn code(&self) -> &'static str {
        match self {
            Self::ManifestMissing(_) => "RESOLVE_MANIFEST_MISSING",
            Self::ManifestInvalid(_) => "RESOLVE_MANIFEST_INVALID",
            Self::NoDeployment(_) => "RESOLVE_NO_DEPLOYMENT",
            Self::InvalidAddress(_) => "RESOLVE_INVALID_ADDRESS",
        }
    }
}

/// Terminal failure of the registration gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The user answered "no" to the registration confirmation.
    #[error("Registration cancelled by user")]
    Declined,
    /// The wallet refused to sign the registration transaction.
    #[error("Registration transaction was rejected in the wallet")]
    Rejected,
    #[error("Failed to register as citizen: {0}")]
    Failed(String),
}

impl RegistrationError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Declined | Self::Rejected)
    }
}

impl ErrorCode for RegistrationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Declined => "USER_DECLINED",
            Self::Rejected => "USER_REJECTED",
            Self::Failed(_) => "SUBMISSION_FAILED",
        }
    }
}

/// Failure to submit a vote, proposal or issue report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please connect your wallet first")]
    NotConnected,
    /// The resolved contract interface does not declare the method (degraded mode).
    #[error("Contract method '{0}' is unavailable on the resolved interface")]
    Unsupported(&'static str),
    #[error("Transaction was rejected in the wallet")]
    Rejected,
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
}

impl ErrorCode for SubmitError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::Unsupported(_) => "UNSUPPORTED_IN_DEGRADED_MODE",
            Self::Rejected => "USER_REJECTED",
            Self::SubmissionFailed(_) => "SUBMISSION_FAILED",
        }
    }
}
