//! Database initialization
//!
//! Creates the SHELF schema on first run. Every statement is idempotent so
//! initialization can be repeated against an existing database.

use crate::tier::{Tier, FEATURE_MIN_TIER};
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign keys are per connection, so they are set on every pooled one
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    seed_tier_features(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_books_table(pool).await?;
    create_book_contributors_table(pool).await?;
    create_provenance_entries_table(pool).await?;
    create_valuation_history_table(pool).await?;
    create_user_profiles_table(pool).await?;
    create_tier_features_table(pool).await?;
    create_user_sessions_table(pool).await?;

    Ok(())
}

async fn create_books_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            isbn_10 TEXT,
            isbn_13 TEXT,
            oclc_number TEXT,
            lccn TEXT,
            cover_image_url TEXT,
            condition_id TEXT,
            publisher_name TEXT,
            publisher_id TEXT,
            publication_year TEXT,
            language_id TEXT,
            storage_location TEXT,
            status TEXT NOT NULL DEFAULT 'in_collection',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_user_id ON books(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_book_contributors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_contributors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            contributor_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'author'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_book_contributors_book_id ON book_contributors(book_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_provenance_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provenance_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            owner_name TEXT,
            acquired_on TEXT,
            notes TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_provenance_entries_book_id ON provenance_entries(book_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_valuation_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS valuation_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            value_cents INTEGER NOT NULL,
            currency TEXT NOT NULL DEFAULT 'EUR',
            recorded_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_valuation_history_book_id ON valuation_history(book_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_profiles (
            id TEXT PRIMARY KEY,
            membership_tier TEXT NOT NULL DEFAULT 'collector',
            is_lifetime_free INTEGER NOT NULL DEFAULT 0,
            benefit_expires_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tier_features_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tier_features (
            tier TEXT NOT NULL,
            feature TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (tier, feature)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the default feature matrix; existing rows are left untouched
pub async fn seed_tier_features(pool: &SqlitePool) -> Result<()> {
    for tier in Tier::ALL {
        for (feature, min_tier) in FEATURE_MIN_TIER {
            sqlx::query(
                "INSERT OR IGNORE INTO tier_features (tier, feature, enabled) VALUES (?, ?, ?)",
            )
            .bind(tier.as_str())
            .bind(*feature)
            .bind(tier >= *min_tier)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}
