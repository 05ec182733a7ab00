//! shelf-audit library - collection completeness audit service
//!
//! Serves a per-user audit of a book collection: ten data-quality checks,
//! a completeness score and a sample of failing books per check.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod audit;
pub mod db;
pub mod error;
pub mod pagination;

use audit::{BookStore, RelatedEntityStore};
use db::{SqliteBookStore, SqliteRelatedStore};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (read-only in production)
    pub db: SqlitePool,
    pub books: Arc<dyn BookStore>,
    pub related: Arc<dyn RelatedEntityStore>,
    /// Rows requested per book page
    pub book_page_size: i64,
}

impl AppState {
    /// Create state backed by SQLite stores on `db`
    pub fn new(db: SqlitePool, book_page_size: i64, lookup_chunk_size: usize) -> Self {
        let books = Arc::new(SqliteBookStore::new(db.clone()));
        let related =
            Arc::new(SqliteRelatedStore::new(db.clone()).with_chunk_size(lookup_chunk_size));
        Self::with_stores(db, books, related, book_page_size)
    }

    /// Create state with explicit store implementations
    pub fn with_stores(
        db: SqlitePool,
        books: Arc<dyn BookStore>,
        related: Arc<dyn RelatedEntityStore>,
        book_page_size: i64,
    ) -> Self {
        Self {
            db,
            books,
            related,
            book_page_size: book_page_size.max(1),
        }
    }
}

/// Build application router
///
/// `/health` is public. `/api/*` routes pass through the session middleware,
/// which attaches the caller's identity when a valid bearer token is present.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    let protected = Router::new()
        .route("/api/audit", get(api::get_collection_audit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
