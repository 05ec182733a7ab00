//! # SHELF Common Library
//!
//! Shared code for the SHELF services including:
//! - Book record model and status vocabulary
//! - Database schema creation
//! - Configuration loading and root folder resolution
//! - Session lookup for authenticated requests
//! - Membership tiers and feature gating

pub mod config;
pub mod db;
pub mod error;
pub mod session;
pub mod tier;

pub use db::models::{BookRecord, BookStatus};
pub use error::{Error, Result};
pub use session::AuthenticatedUser;
pub use tier::Tier;
