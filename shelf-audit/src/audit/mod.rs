//! Collection audit
//!
//! Scores the completeness of one user's book collection and lists the books
//! failing each data-quality check. The audit reads every book the user owns
//! page by page, asks the related-entity store which books have contributor,
//! provenance and valuation records, then classifies and scores in memory.
//!
//! The auditor never returns an error to its caller. Missing identity and
//! store failures both produce a zeroed [`AuditResult`] carrying an `error`
//! message; the underlying store error is only logged.

pub mod checks;
pub mod store;

use serde::Serialize;
use shelf_common::{AuthenticatedUser, BookRecord, Result};
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::pagination::{PageWindow, BOOK_PAGE_SIZE};

pub use checks::{
    CheckDefinition, CheckOutcome, FixType, RelatedEvidence, Severity, AUDIT_CHECKS,
};
pub use store::{BookStore, RelatedEntityStore, RelatedKind};

/// Sample size of failing books kept per category
pub const MAX_BOOKS_PER_CATEGORY: usize = 50;

pub const NOT_AUTHENTICATED: &str = "Not authenticated";
pub const AUDIT_FAILED: &str = "Failed to run audit";

/// A failing book as listed under a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBook {
    pub id: String,
    pub title: String,
    pub fix_href: String,
}

/// Outcome of one check across the whole collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub severity: Severity,
    pub fix_type: FixType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_section: Option<&'static str>,
    /// Books failing the check
    pub count: usize,
    /// Books the check applies to that pass it
    pub passed: usize,
    /// First failing books, in store order
    pub books: Vec<AuditBook>,
}

impl AuditCategory {
    fn empty(check: &CheckDefinition) -> Self {
        Self {
            key: check.key,
            label: check.label,
            severity: check.severity,
            fix_type: check.fix_type,
            fix_section: check.fix_section,
            count: 0,
            passed: 0,
            books: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResult {
    pub total_books: usize,
    /// Completeness percentage, 0-100
    pub score: u8,
    /// Sum of all category counts; one book may count several times
    pub total_issues: usize,
    pub categories: Vec<AuditCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditResult {
    /// Zeroed result carrying an error message
    pub fn failed(message: &str) -> Self {
        Self {
            total_books: 0,
            score: 0,
            total_issues: 0,
            categories: Vec::new(),
            error: Some(message.to_string()),
        }
    }

    /// Result for a user without books: fully healthy, every category empty
    pub fn empty_collection() -> Self {
        Self {
            total_books: 0,
            score: 100,
            total_issues: 0,
            categories: AUDIT_CHECKS.iter().map(AuditCategory::empty).collect(),
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }

    pub fn categories_with_issues(&self) -> usize {
        self.categories.iter().filter(|c| c.count > 0).count()
    }

    pub fn category(&self, key: &str) -> Option<&AuditCategory> {
        self.categories.iter().find(|c| c.key == key)
    }
}

/// Coarse rating of a score for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    /// 90 and above
    Healthy,
    /// 70 to 89
    Fair,
    /// Below 70
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 90 {
            ScoreBand::Healthy
        } else if score >= 70 {
            ScoreBand::Fair
        } else {
            ScoreBand::Poor
        }
    }
}

/// Classify and score `books` against `checks`
///
/// Every check is worth one point per book; a not-applicable check counts as
/// passed. Severity plays no part in the score.
pub fn summarize(
    books: &[BookRecord],
    evidence: &RelatedEvidence,
    checks: &[CheckDefinition],
) -> AuditResult {
    if books.is_empty() {
        return AuditResult {
            categories: checks.iter().map(AuditCategory::empty).collect(),
            ..AuditResult::empty_collection()
        };
    }

    let mut failing: Vec<Vec<&BookRecord>> = vec![Vec::new(); checks.len()];
    let mut eligible = vec![0usize; checks.len()];
    let mut points: u64 = 0;

    for book in books {
        for (index, check) in checks.iter().enumerate() {
            match (check.evaluate)(book, evidence) {
                CheckOutcome::Pass => {
                    points += 1;
                    eligible[index] += 1;
                }
                CheckOutcome::NotApplicable => points += 1,
                CheckOutcome::Fail => {
                    eligible[index] += 1;
                    failing[index].push(book);
                }
            }
        }
    }

    let max_points = books.len() as u64 * checks.len() as u64;
    let score = if max_points == 0 {
        100
    } else {
        // round half up without floating point
        ((points * 200 + max_points) / (max_points * 2)) as u8
    };

    let categories: Vec<AuditCategory> = checks
        .iter()
        .zip(failing)
        .zip(eligible)
        .map(|((check, failed), eligible)| AuditCategory {
            count: failed.len(),
            passed: eligible - failed.len(),
            books: failed
                .iter()
                .take(MAX_BOOKS_PER_CATEGORY)
                .map(|book| AuditBook {
                    id: book.id.clone(),
                    title: book.title.clone(),
                    fix_href: check.fix_href(&book.id),
                })
                .collect(),
            ..AuditCategory::empty(check)
        })
        .collect();

    let total_issues = categories.iter().map(|c| c.count).sum();

    AuditResult {
        total_books: books.len(),
        score,
        total_issues,
        categories,
        error: None,
    }
}

/// Runs audits against a pair of stores
pub struct CollectionAuditor<'a> {
    books: &'a dyn BookStore,
    related: &'a dyn RelatedEntityStore,
    page_size: i64,
}

impl<'a> CollectionAuditor<'a> {
    pub fn new(books: &'a dyn BookStore, related: &'a dyn RelatedEntityStore) -> Self {
        Self {
            books,
            related,
            page_size: BOOK_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Audit every book owned by `user`
    pub async fn run(&self, user: Option<&AuthenticatedUser>) -> AuditResult {
        let Some(user) = user else {
            debug!("Collection audit requested without an authenticated user");
            return AuditResult::failed(NOT_AUTHENTICATED);
        };

        match self.audit_user(user.user_id).await {
            Ok(result) => result,
            Err(e) => {
                error!(user_id = %user.user_id, error = %e, "Failed to run collection audit");
                AuditResult::failed(AUDIT_FAILED)
            }
        }
    }

    async fn audit_user(&self, user_id: Uuid) -> Result<AuditResult> {
        let started = Instant::now();

        let books = self.fetch_all_books(user_id).await?;
        if books.is_empty() {
            info!(%user_id, "Collection audit: no books");
            return Ok(AuditResult::empty_collection());
        }

        let evidence = self.fetch_evidence(&books).await?;
        let result = summarize(&books, &evidence, &AUDIT_CHECKS);

        info!(
            %user_id,
            total_books = result.total_books,
            score = result.score,
            total_issues = result.total_issues,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Collection audit complete"
        );

        Ok(result)
    }

    async fn fetch_all_books(&self, user_id: Uuid) -> Result<Vec<BookRecord>> {
        let mut books = Vec::new();
        let mut window = PageWindow::first(self.page_size);

        loop {
            let page = self
                .books
                .fetch_books_for_user(user_id, window.offset, window.limit)
                .await?;
            let received = page.len();
            books.extend(page);

            debug!(offset = window.offset, received, "Fetched book page");

            if window.is_last(received) {
                break;
            }
            window = window.next();
        }

        Ok(books)
    }

    async fn fetch_evidence(&self, books: &[BookRecord]) -> Result<RelatedEvidence> {
        let ids: Vec<String> = books.iter().map(|b| b.id.clone()).collect();

        let (with_contributors, with_provenance, with_valuation) = tokio::try_join!(
            self.related
                .book_ids_with_children(RelatedKind::ContributorLink, &ids),
            self.related
                .book_ids_with_children(RelatedKind::ProvenanceEntry, &ids),
            self.related
                .book_ids_with_children(RelatedKind::ValuationEntry, &ids),
        )?;

        Ok(RelatedEvidence {
            with_contributors,
            with_provenance,
            with_valuation,
        })
    }
}

/// Audit `user`'s collection with the default page size
pub async fn run_collection_audit(
    user: Option<&AuthenticatedUser>,
    books: &dyn BookStore,
    related: &dyn RelatedEntityStore,
) -> AuditResult {
    CollectionAuditor::new(books, related).run(user).await
}
