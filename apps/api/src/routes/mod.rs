pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog
        .route("/api/v1/book-types", get(handlers::handle_list_book_types))
        .route(
            "/api/v1/admin/book-types/:slug",
            patch(handlers::handle_update_book_type),
        )
        // Books
        .route("/api/v1/books", post(handlers::handle_create_book))
        .route("/api/v1/books/:id", get(handlers::handle_get_book))
        .route(
            "/api/v1/books/:id/purchase",
            post(handlers::handle_purchase),
        )
        .route("/api/v1/books/:id/print", post(handlers::handle_print))
        // Print fulfillment
        .route(
            "/api/v1/print-orders/:reference",
            get(handlers::handle_print_order_status),
        )
        .with_state(state)
}
