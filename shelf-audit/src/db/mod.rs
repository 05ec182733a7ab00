//! Database access layer for shelf-audit
//!
//! All connections opened here are read-only; the audit never writes.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

mod books;
mod related;

pub use books::SqliteBookStore;
pub use related::SqliteRelatedStore;

/// Connect to the database in read-only mode
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found: {}\nRun `shelf-audit init-db` first to create it.",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());

    let pool = SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to database in read-only mode")?;

    Ok(pool)
}
