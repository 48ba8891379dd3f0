use std::sync::Arc;

use crate::config::Config;
use crate::generation::catalog::Catalog;
use crate::generation::orchestrator::BookAssembler;
use crate::publishing::PrintFulfillment;
use crate::store::BookStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The assembly pipeline plus lifecycle transitions; owns the generation,
    /// payment, and storage collaborator handles.
    pub assembler: Arc<BookAssembler>,
    /// Read path for books (the assembler owns the write path).
    pub store: Arc<dyn BookStore>,
    pub catalog: Arc<Catalog>,
    /// Direct handle for pass-through print-order status polls.
    pub printer: Arc<dyn PrintFulfillment>,
    /// Retained for handlers that need runtime settings (none yet).
    #[allow(dead_code)]
    pub config: Config,
}
