//! Business logic services.

pub mod cleanup;
pub mod credentials;
pub mod event_broadcaster;
pub mod federated;
pub mod session;
pub mod store;
pub mod upload;

pub use cleanup::{CleanupConfig, start_cleanup_task};
pub use credentials::configure_routes as configure_credential_routes;
pub use event_broadcaster::EventBroadcaster;
pub use federated::{GoogleOAuthClient, configure_routes as configure_federated_routes};
pub use session::{SessionObserver, SessionRegistry};
