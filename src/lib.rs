pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod testing;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{CivicApp, NotificationBoard, RefreshTracker, SessionSnapshot};
pub use crypto::hashing::derive_citizen_id;
pub use domain::contract::ContractResolver;
pub use domain::provider::ProviderBinding;
pub use infra::config::ClientConfig;
