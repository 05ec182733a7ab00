//! Collaborator interfaces consumed by the auditor

use async_trait::async_trait;
use shelf_common::{BookRecord, Result};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Child-record tables keyed by book id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelatedKind {
    ContributorLink,
    ProvenanceEntry,
    ValuationEntry,
}

impl RelatedKind {
    pub const ALL: [RelatedKind; 3] = [
        RelatedKind::ContributorLink,
        RelatedKind::ProvenanceEntry,
        RelatedKind::ValuationEntry,
    ];

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            RelatedKind::ContributorLink => "book_contributors",
            RelatedKind::ProvenanceEntry => "provenance_entries",
            RelatedKind::ValuationEntry => "valuation_history",
        }
    }
}

/// Source of a user's book records
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Fetch one page of the user's books in a stable order
    ///
    /// A page shorter than `limit` means there are no further rows.
    async fn fetch_books_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<BookRecord>>;
}

/// Existence checks for child records of books
#[async_trait]
pub trait RelatedEntityStore: Send + Sync {
    /// Largest id list a single `fetch_chunk` call accepts
    fn max_filter_ids(&self) -> usize;

    /// Ids from `book_ids` that have at least one `kind` record
    ///
    /// `book_ids.len()` never exceeds `max_filter_ids()`.
    async fn fetch_chunk(&self, kind: RelatedKind, book_ids: &[String]) -> Result<HashSet<String>>;

    /// Ids from `book_ids` that have at least one `kind` record, for any
    /// number of ids. Chunks are fetched one after another.
    async fn book_ids_with_children(
        &self,
        kind: RelatedKind,
        book_ids: &[String],
    ) -> Result<HashSet<String>> {
        let chunk_size = self.max_filter_ids().max(1);
        let mut found = HashSet::new();

        for chunk in book_ids.chunks(chunk_size) {
            found.extend(self.fetch_chunk(kind, chunk).await?);
        }

        debug!(
            kind = ?kind,
            requested = book_ids.len(),
            found = found.len(),
            chunks = book_ids.len().div_ceil(chunk_size),
            "Related-record lookup complete"
        );

        Ok(found)
    }
}
