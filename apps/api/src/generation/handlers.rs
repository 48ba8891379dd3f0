//! Axum route handlers for the book API.
//!
//! Handlers validate trivially and delegate to the orchestrator or the
//! collaborator adapters; no business logic lives here.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::book_type::BookTypeKind;
use crate::generation::catalog::PricingRow;
use crate::generation::orchestrator::CreateBookRequest;
use crate::models::book::Book;
use crate::publishing::{PrintOrderReceipt, ShippingAddress};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BookTypeSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: i64,
    pub preview_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct BookTypeListResponse {
    pub book_types: Vec<BookTypeSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub payment_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookTypeRequest {
    pub price_cents: Option<i64>,
    pub preview_price_cents: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdateBookTypeResponse {
    pub id: String,
    #[serde(flatten)]
    pub pricing: PricingRow,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/book-types
///
/// Lists the purchasable book types currently active in the catalog.
pub async fn handle_list_book_types(
    State(state): State<AppState>,
) -> Result<Json<BookTypeListResponse>, AppError> {
    let book_types = state
        .catalog
        .list()?
        .into_iter()
        .filter(|(_, pricing)| pricing.active)
        .map(|(kind, pricing)| BookTypeSummary {
            id: kind.slug(),
            name: kind.display_name(),
            description: kind.description(),
            price_cents: pricing.price_cents,
            preview_price_cents: pricing.preview_price_cents,
        })
        .collect();

    Ok(Json(BookTypeListResponse { book_types }))
}

/// POST /api/v1/books
///
/// Runs the full assembly pipeline and returns the preview book.
pub async fn handle_create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> Result<Json<Book>, AppError> {
    let book = state.assembler.assemble(request).await?;
    Ok(Json(book))
}

/// GET /api/v1/books/:id
pub async fn handle_get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<Book>, AppError> {
    let book = state
        .store
        .load(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {book_id} not found")))?;
    Ok(Json(book))
}

/// POST /api/v1/books/:id/purchase
///
/// Finalizes a purchase. Idempotent: re-posting for a purchased book returns
/// the book unchanged.
pub async fn handle_purchase(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<Book>, AppError> {
    if request.payment_reference.trim().is_empty() {
        return Err(AppError::Validation(
            "payment_reference cannot be empty".to_string(),
        ));
    }

    let book = state
        .assembler
        .finalize_purchase(book_id, &request.payment_reference)
        .await?;
    Ok(Json(book))
}

/// POST /api/v1/books/:id/print
pub async fn handle_print(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(request): Json<PrintRequest>,
) -> Result<Json<PrintOrderReceipt>, AppError> {
    let receipt = state
        .assembler
        .send_to_print(book_id, request.shipping_address)
        .await?;
    Ok(Json(receipt))
}

/// GET /api/v1/print-orders/:reference
///
/// Pass-through status poll against the print vendor.
pub async fn handle_print_order_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PrintOrderReceipt>, AppError> {
    let receipt = state.printer.order_status(&reference).await?;
    Ok(Json(receipt))
}

/// PATCH /api/v1/admin/book-types/:slug
///
/// Admin edit of price and availability. Book types themselves are a closed
/// set; only pricing attributes change here.
pub async fn handle_update_book_type(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<UpdateBookTypeRequest>,
) -> Result<Json<UpdateBookTypeResponse>, AppError> {
    let kind: BookTypeKind = slug.parse()?;
    let pricing = state.catalog.update(
        kind,
        request.price_cents,
        request.preview_price_cents,
        request.active,
    )?;

    Ok(Json(UpdateBookTypeResponse {
        id: kind.slug().to_string(),
        pricing,
    }))
}
