//! Domain types for books and their pages.
//!
//! A `Book`'s page sequence is assembled once and never reordered. Lifecycle
//! moves one way: `preview → purchased → published`. `price_paid_cents` is
//! set exactly once, at the preview→purchased transition, to the catalog
//! price current at that moment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generation::book_type::BookTypeKind;

/// Book lifecycle status. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Preview,
    Purchased,
    Published,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Preview => "preview",
            BookStatus::Purchased => "purchased",
            BookStatus::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "preview" => Some(BookStatus::Preview),
            "purchased" => Some(BookStatus::Purchased),
            "published" => Some(BookStatus::Published),
            _ => None,
        }
    }
}

/// User-supplied answers to a book type's required prompt fields.
/// Unknown extra fields are tolerated (client-side drift) and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptSet(pub HashMap<String, String>);

impl PromptSet {
    /// Returns the trimmed value for a field, or None if absent or blank.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for PromptSet {
    fn from(pairs: [(&str, &str); N]) -> Self {
        PromptSet(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// One unit of narrative text + illustration within a book.
///
/// `index` is 1-based and sequence-stable. `illustration_url` is None when
/// the page fell back to the placeholder illustration. `artifact_key` points
/// at the rendered PNG in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub index: u32,
    pub text: String,
    pub illustration_url: Option<String>,
    pub artifact_key: String,
    pub watermarked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub book_type: BookTypeKind,
    pub owner_id: Option<Uuid>,
    pub status: BookStatus,
    pub price_paid_cents: Option<i64>,
    pub pages: Vec<Page>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
