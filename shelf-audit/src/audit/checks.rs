//! Data-completeness checks
//!
//! Each check is one row of [`AUDIT_CHECKS`]. Display metadata (label,
//! severity, fix hints) lives next to the predicate; the scorer weighs every
//! row equally regardless of severity.

use serde::Serialize;
use shelf_common::BookRecord;
use std::collections::HashSet;

/// Display priority of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// Which remediation screen fixes a failing book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixType {
    /// Automatic metadata lookup
    Enrich,
    /// Manual editing
    Edit,
}

/// Result of evaluating one check against one book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    /// The check does not apply; scores as a pass, excluded from `passed`
    NotApplicable,
}

impl CheckOutcome {
    fn from_present(present: bool) -> Self {
        if present {
            CheckOutcome::Pass
        } else {
            CheckOutcome::Fail
        }
    }
}

/// Book ids known to have at least one child record of each kind
#[derive(Debug, Clone, Default)]
pub struct RelatedEvidence {
    pub with_contributors: HashSet<String>,
    pub with_provenance: HashSet<String>,
    pub with_valuation: HashSet<String>,
}

/// Static definition of one audit category
#[derive(Clone, Copy)]
pub struct CheckDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub severity: Severity,
    pub fix_type: FixType,
    /// Edit-page section to scroll to
    pub fix_section: Option<&'static str>,
    pub evaluate: fn(&BookRecord, &RelatedEvidence) -> CheckOutcome,
}

pub static AUDIT_CHECKS: [CheckDefinition; 10] = [
    CheckDefinition {
        key: "no_identifiers",
        label: "No identifiers",
        severity: Severity::High,
        fix_type: FixType::Enrich,
        fix_section: None,
        evaluate: |book, _| CheckOutcome::from_present(book.has_identifier()),
    },
    CheckDefinition {
        key: "no_contributors",
        label: "No contributors",
        severity: Severity::High,
        fix_type: FixType::Edit,
        fix_section: Some("contributors"),
        evaluate: |book, evidence| {
            CheckOutcome::from_present(evidence.with_contributors.contains(&book.id))
        },
    },
    CheckDefinition {
        key: "no_cover",
        label: "No cover image",
        severity: Severity::Medium,
        fix_type: FixType::Enrich,
        fix_section: None,
        evaluate: |book, _| CheckOutcome::from_present(book.cover_image_url.is_some()),
    },
    CheckDefinition {
        key: "no_condition",
        label: "No condition",
        severity: Severity::Medium,
        fix_type: FixType::Edit,
        fix_section: Some("condition"),
        evaluate: |book, _| CheckOutcome::from_present(book.condition_id.is_some()),
    },
    CheckDefinition {
        key: "no_publisher",
        label: "No publisher",
        severity: Severity::Medium,
        fix_type: FixType::Enrich,
        fix_section: None,
        evaluate: |book, _| CheckOutcome::from_present(book.has_publisher()),
    },
    CheckDefinition {
        key: "no_year",
        label: "No publication year",
        severity: Severity::Medium,
        fix_type: FixType::Enrich,
        fix_section: None,
        evaluate: |book, _| CheckOutcome::from_present(book.publication_year.is_some()),
    },
    CheckDefinition {
        key: "no_provenance",
        label: "No provenance",
        severity: Severity::Low,
        fix_type: FixType::Edit,
        fix_section: Some("provenance"),
        evaluate: |book, evidence| {
            if !book.status.implies_ownership() {
                return CheckOutcome::NotApplicable;
            }
            CheckOutcome::from_present(evidence.with_provenance.contains(&book.id))
        },
    },
    CheckDefinition {
        key: "no_valuation",
        label: "No valuation",
        severity: Severity::Low,
        fix_type: FixType::Edit,
        fix_section: Some("valuation"),
        evaluate: |book, evidence| {
            CheckOutcome::from_present(evidence.with_valuation.contains(&book.id))
        },
    },
    CheckDefinition {
        key: "no_language",
        label: "No language",
        severity: Severity::Low,
        fix_type: FixType::Edit,
        fix_section: Some("basic"),
        evaluate: |book, _| CheckOutcome::from_present(book.language_id.is_some()),
    },
    CheckDefinition {
        key: "no_location",
        label: "No location",
        severity: Severity::Low,
        fix_type: FixType::Edit,
        fix_section: Some("physical"),
        evaluate: |book, _| CheckOutcome::from_present(book.storage_location.is_some()),
    },
];

impl CheckDefinition {
    /// Link to the screen that fixes `book_id` for this check
    pub fn fix_href(&self, book_id: &str) -> String {
        match (self.fix_type, self.fix_section) {
            (FixType::Enrich, _) => format!("/books/{}/edit?enrich=true", book_id),
            (FixType::Edit, Some(section)) => format!("/books/{}/edit#{}", book_id, section),
            (FixType::Edit, None) => format!("/books/{}/edit", book_id),
        }
    }
}
