//! Database models and schema

pub mod init;
pub mod models;

pub use init::{create_schema, init_database, seed_tier_features};
pub use models::{non_blank, BookRecord, BookStatus};
