//! SQLite-backed existence checks for book child records

use async_trait::async_trait;
use shelf_common::config::DEFAULT_LOOKUP_CHUNK_SIZE;
use shelf_common::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

use crate::audit::{RelatedEntityStore, RelatedKind};

#[derive(Clone)]
pub struct SqliteRelatedStore {
    pool: SqlitePool,
    chunk_size: usize,
}

impl SqliteRelatedStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_LOOKUP_CHUNK_SIZE,
        }
    }

    /// Override the `IN (...)` list limit
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait]
impl RelatedEntityStore for SqliteRelatedStore {
    fn max_filter_ids(&self) -> usize {
        self.chunk_size
    }

    async fn fetch_chunk(&self, kind: RelatedKind, book_ids: &[String]) -> Result<HashSet<String>> {
        if book_ids.is_empty() {
            return Ok(HashSet::new());
        }

        // table name comes from a fixed enum, never from input
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT DISTINCT book_id FROM {} WHERE book_id IN (",
            kind.table()
        ));
        let mut ids = query.separated(", ");
        for id in book_ids {
            ids.push_bind(id.as_str());
        }
        ids.push_unseparated(")");

        let found: Vec<String> = query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        Ok(found.into_iter().collect())
    }
}
