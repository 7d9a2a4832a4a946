//! Session, identity, registration and action protocol of the civic client.

pub mod actions;
pub mod contract;
pub mod error;
pub mod feedback;
pub mod provider;
pub mod registration;
pub mod session;
pub mod types;

pub use actions::{Action, ActionSubmitter};
pub use contract::{ContractClient, ContractHandle, ContractResolver};
pub use error::{ConnectError, ErrorCode, RegistrationError, ResolveError, RpcError, SubmitError};
pub use feedback::{DataRefresher, DataScope, NotificationSink, Severity};
pub use provider::{ProviderBinding, ProviderKind, WalletProvider};
pub use registration::{GateState, RegistrationGate, RegistrationPrompt};
pub use session::Session;
pub use types::{Address, CitizenId, NetworkId, ProviderEvent};
