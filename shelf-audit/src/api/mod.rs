//! HTTP API handlers for shelf-audit

pub mod audit;
pub mod auth;
pub mod health;

pub use audit::get_collection_audit;
pub use auth::session_middleware;
pub use health::health_routes;
