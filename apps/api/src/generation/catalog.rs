//! Pricing catalog for the closed set of book types.
//!
//! Book types themselves are code (`BookTypeKind`); price and availability
//! are the only admin-editable attributes. `finalize_purchase` reads the
//! price here at transition time, never a value cached at book creation.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::book_type::{BookTypeKind, ALL_KINDS};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingRow {
    pub price_cents: i64,
    pub preview_price_cents: i64,
    pub active: bool,
}

/// In-process catalog of per-kind pricing. Reads vastly outnumber admin
/// writes; a std RwLock is sufficient (no await while held).
pub struct Catalog {
    rows: RwLock<HashMap<BookTypeKind, PricingRow>>,
}

impl Catalog {
    pub fn with_defaults() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            BookTypeKind::ChildrenStory,
            PricingRow {
                price_cents: 1999,
                preview_price_cents: 0,
                active: true,
            },
        );
        rows.insert(
            BookTypeKind::SpouseRoasting,
            PricingRow {
                price_cents: 2499,
                preview_price_cents: 0,
                active: true,
            },
        );
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn pricing(&self, kind: BookTypeKind) -> Result<PricingRow, AppError> {
        self.rows
            .read()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("catalog lock poisoned")))?
            .get(&kind)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No catalog entry for {}", kind.slug())))
    }

    /// Applies an admin edit; unspecified attributes are left unchanged.
    pub fn update(
        &self,
        kind: BookTypeKind,
        price_cents: Option<i64>,
        preview_price_cents: Option<i64>,
        active: Option<bool>,
    ) -> Result<PricingRow, AppError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("catalog lock poisoned")))?;
        let row = rows
            .get_mut(&kind)
            .ok_or_else(|| AppError::NotFound(format!("No catalog entry for {}", kind.slug())))?;

        if let Some(price) = price_cents {
            if price < 0 {
                return Err(AppError::Validation("price_cents must be >= 0".to_string()));
            }
            row.price_cents = price;
        }
        if let Some(preview) = preview_price_cents {
            if preview < 0 {
                return Err(AppError::Validation(
                    "preview_price_cents must be >= 0".to_string(),
                ));
            }
            row.preview_price_cents = preview;
        }
        if let Some(active) = active {
            row.active = active;
        }

        Ok(*row)
    }

    /// Catalog listing in display order, skipping nothing; callers filter
    /// on `active` as needed.
    pub fn list(&self) -> Result<Vec<(BookTypeKind, PricingRow)>, AppError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("catalog lock poisoned")))?;
        Ok(ALL_KINDS
            .iter()
            .filter_map(|kind| rows.get(kind).map(|row| (*kind, *row)))
            .collect())
    }
}
