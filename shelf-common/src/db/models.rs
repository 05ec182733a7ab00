//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a book in a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    InCollection,
    Lent,
    Borrowed,
    Double,
    ToSell,
    OnSale,
    Reserved,
    Sold,
    Ordered,
    Lost,
    Donated,
    Destroyed,
    Unknown,
}

impl BookStatus {
    pub const ALL: [BookStatus; 13] = [
        BookStatus::InCollection,
        BookStatus::Lent,
        BookStatus::Borrowed,
        BookStatus::Double,
        BookStatus::ToSell,
        BookStatus::OnSale,
        BookStatus::Reserved,
        BookStatus::Sold,
        BookStatus::Ordered,
        BookStatus::Lost,
        BookStatus::Donated,
        BookStatus::Destroyed,
        BookStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::InCollection => "in_collection",
            BookStatus::Lent => "lent",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Double => "double",
            BookStatus::ToSell => "to_sell",
            BookStatus::OnSale => "on_sale",
            BookStatus::Reserved => "reserved",
            BookStatus::Sold => "sold",
            BookStatus::Ordered => "ordered",
            BookStatus::Lost => "lost",
            BookStatus::Donated => "donated",
            BookStatus::Destroyed => "destroyed",
            BookStatus::Unknown => "unknown",
        }
    }

    /// Statuses for which the owner is expected to have recorded provenance
    pub fn implies_ownership(&self) -> bool {
        matches!(
            self,
            BookStatus::InCollection
                | BookStatus::Lent
                | BookStatus::Borrowed
                | BookStatus::Double
                | BookStatus::ToSell
                | BookStatus::OnSale
                | BookStatus::Reserved
                | BookStatus::Sold
        )
    }
}

impl FromStr for BookStatus {
    type Err = std::convert::Infallible;

    /// Unrecognised values map to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BookStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim())
            .unwrap_or(BookStatus::Unknown))
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One book owned by a single user, as read for auditing
///
/// Optional text fields are `None` when the stored value is NULL or blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub oclc_number: Option<String>,
    pub lccn: Option<String>,
    pub cover_image_url: Option<String>,
    pub condition_id: Option<String>,
    pub publisher_name: Option<String>,
    pub publisher_id: Option<String>,
    pub publication_year: Option<String>,
    pub language_id: Option<String>,
    pub storage_location: Option<String>,
    pub status: BookStatus,
}

impl BookRecord {
    /// A record with only an id and title set
    pub fn bare(id: impl Into<String>, title: impl Into<String>, status: BookStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            isbn10: None,
            isbn13: None,
            oclc_number: None,
            lccn: None,
            cover_image_url: None,
            condition_id: None,
            publisher_name: None,
            publisher_id: None,
            publication_year: None,
            language_id: None,
            storage_location: None,
            status,
        }
    }

    pub fn has_identifier(&self) -> bool {
        self.isbn10.is_some()
            || self.isbn13.is_some()
            || self.oclc_number.is_some()
            || self.lccn.is_some()
    }

    pub fn has_publisher(&self) -> bool {
        self.publisher_name.is_some() || self.publisher_id.is_some()
    }
}

/// Treat NULL, empty and whitespace-only text as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
