//! API endpoint modules.

pub mod auth;
pub mod drafts;
pub mod health;
pub mod openapi;
pub mod websocket;

pub use auth::configure_routes as configure_auth_routes;
pub use drafts::configure_routes as configure_draft_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use websocket::configure_routes as configure_websocket_routes;
