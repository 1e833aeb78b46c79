//! HTTP endpoint modules.

pub mod health;
pub mod pages;
pub mod websocket;

pub use health::configure_health_routes;
pub use pages::{configure_api_routes as configure_session_routes, configure_page_routes};
pub use websocket::configure_routes as configure_websocket_routes;
