pub mod civic_app;
pub mod notifications;
pub mod refresh;

pub use civic_app::{CivicApp, SessionSnapshot};
pub use notifications::{Notification, NotificationBoard};
pub use refresh::RefreshTracker;
