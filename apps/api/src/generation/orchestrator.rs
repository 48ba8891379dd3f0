//! Book Assembly Orchestrator — sequences the pipeline into a Book and owns
//! its lifecycle transitions.
//!
//! Flow: validate prompts → generate narrative → fan out illustrations →
//!       compose pages (watermarked) → upload artifacts → save.
//!
//! Assembly is all-or-nothing: the Book reaches the store only after every
//! page is rendered. `finalize_purchase` is the one-way, idempotent
//! preview→purchased transition; `send_to_print` packages a purchased book
//! for the print vendor.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::compositor::{placeholder_png, PageComposer};
use crate::config::PageFailurePolicy;
use crate::errors::AppError;
use crate::generation::book_type::BookTypeKind;
use crate::generation::catalog::Catalog;
use crate::generation::illustration::{request_illustrations, PageArt};
use crate::generation::narrative::generate_narrative;
use crate::generation::validator::validate_prompt_set;
use crate::image_client::ImageGenerator;
use crate::llm_client::TextGenerator;
use crate::models::book::{Book, BookStatus, Page, PromptSet};
use crate::payments::PaymentVerifier;
use crate::publishing::{PrintFulfillment, PrintOrder, PrintOrderReceipt, ShippingAddress};
use crate::store::artifacts::ArtifactStore;
use crate::store::BookStore;

/// Request body for book assembly.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookRequest {
    pub book_type: String,
    pub title: Option<String>,
    pub prompts: PromptSet,
    pub owner_id: Option<Uuid>,
    /// Per-request override of the configured page-failure policy.
    pub on_page_failure: Option<PageFailurePolicy>,
}

/// Owns the collaborator handles and runs the assembly pipeline.
pub struct BookAssembler {
    text_gen: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    payments: Arc<dyn PaymentVerifier>,
    printer: Arc<dyn PrintFulfillment>,
    store: Arc<dyn BookStore>,
    artifacts: Arc<dyn ArtifactStore>,
    catalog: Arc<Catalog>,
    composer: Arc<PageComposer>,
    default_policy: PageFailurePolicy,
}

impl BookAssembler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text_gen: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        payments: Arc<dyn PaymentVerifier>,
        printer: Arc<dyn PrintFulfillment>,
        store: Arc<dyn BookStore>,
        artifacts: Arc<dyn ArtifactStore>,
        catalog: Arc<Catalog>,
        composer: Arc<PageComposer>,
        default_policy: PageFailurePolicy,
    ) -> Self {
        Self {
            text_gen,
            images,
            payments,
            printer,
            store,
            artifacts,
            catalog,
            composer,
            default_policy,
        }
    }

    /// Assembles a new `preview` Book. Every page renders with the watermark.
    ///
    /// Any step failing aborts the assembly; nothing is saved.
    pub async fn assemble(&self, request: CreateBookRequest) -> Result<Book, AppError> {
        let kind: BookTypeKind = request.book_type.parse()?;

        let pricing = self.catalog.pricing(kind)?;
        if !pricing.active {
            return Err(AppError::Validation(format!(
                "Book type '{}' is not currently available",
                kind.slug()
            )));
        }

        validate_prompt_set(kind, &request.prompts)?;

        info!("Generating narrative for a new {} book", kind.slug());
        let page_texts = generate_narrative(self.text_gen.as_ref(), kind, &request.prompts).await?;
        info!("Narrative produced {} page(s)", page_texts.len());

        let policy = request.on_page_failure.unwrap_or(self.default_policy);
        let art = request_illustrations(Arc::clone(&self.images), &page_texts, policy).await?;

        let book_id = Uuid::new_v4();
        let mut pages = Vec::with_capacity(page_texts.len());
        for (i, (text, art)) in page_texts.iter().zip(&art).enumerate() {
            let index = i as u32 + 1;
            let png = self.compose_page(text, art, true).await?;
            let artifact_key = self
                .artifacts
                .put_page(book_id, index, true, png)
                .await?;

            pages.push(Page {
                index,
                text: text.clone(),
                illustration_url: art.url.clone(),
                artifact_key,
                watermarked: true,
            });
        }

        let now = Utc::now();
        let book = Book {
            id: book_id,
            title: request
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| default_title(kind, &request.prompts)),
            book_type: kind,
            owner_id: request.owner_id,
            status: BookStatus::Preview,
            price_paid_cents: None,
            pages,
            created_at: now,
            updated_at: now,
        };

        self.store.save(&book).await?;
        info!(
            "Assembled preview book {} ({} pages) for type {}",
            book.id,
            book.pages.len(),
            kind.slug()
        );

        Ok(book)
    }

    /// The one-way preview→purchased transition. Idempotent: finalizing an
    /// already-purchased (or published) book is a no-op.
    ///
    /// Verifies the payment, sets `price_paid_cents` exactly once — to the
    /// catalog price at this moment, not a value cached at creation — and
    /// re-renders every page without the watermark, reusing the cached text
    /// and illustration references.
    pub async fn finalize_purchase(
        &self,
        book_id: Uuid,
        payment_reference: &str,
    ) -> Result<Book, AppError> {
        let mut book = self
            .store
            .load(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {book_id} not found")))?;

        if book.status != BookStatus::Preview {
            info!("Book {book_id} is already {}; finalize is a no-op", book.status.as_str());
            return Ok(book);
        }

        let verification = self.payments.verify_payment(payment_reference).await?;
        if !verification.succeeded() {
            return Err(AppError::Payment(format!(
                "Payment {payment_reference} has status '{}'",
                verification.status
            )));
        }
        info!(
            "Payment {payment_reference} verified ({} cents settled)",
            verification.amount
        );

        let price_cents = self.catalog.pricing(book.book_type)?.price_cents;

        // Unlock: re-compose only. Narrative and illustrations are reused.
        for page in &mut book.pages {
            let art = self.reload_art(page).await?;
            let png = self.compose_page(&page.text, &art, false).await?;
            page.artifact_key = self
                .artifacts
                .put_page(book.id, page.index, false, png)
                .await?;
            page.watermarked = false;
        }

        book.status = BookStatus::Purchased;
        book.price_paid_cents = Some(price_cents);
        book.updated_at = Utc::now();
        self.store.update(&book).await?;

        info!(
            "Book {} purchased for {} cents via {}",
            book.id, price_cents, payment_reference
        );
        Ok(book)
    }

    /// Packages the unlocked page sequence into a print order and submits it.
    /// Preview books are rejected; published books may be re-submitted.
    pub async fn send_to_print(
        &self,
        book_id: Uuid,
        shipping: ShippingAddress,
    ) -> Result<PrintOrderReceipt, AppError> {
        let mut book = self
            .store
            .load(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {book_id} not found")))?;

        if book.status == BookStatus::Preview {
            return Err(AppError::Validation(
                "Book must be purchased before it can be printed".to_string(),
            ));
        }

        let page_keys = book
            .pages
            .iter()
            .map(|p| p.artifact_key.clone())
            .collect();
        let order = PrintOrder::new(book.title.clone(), page_keys, shipping);
        let receipt = self.printer.submit_order(&order).await?;

        if book.status == BookStatus::Purchased {
            book.status = BookStatus::Published;
            book.updated_at = Utc::now();
            self.store.update(&book).await?;
        }

        info!("Book {} submitted for print: order {}", book.id, receipt.order_id);
        Ok(receipt)
    }

    /// Re-fetches cached illustration bytes for a page; placeholder pages
    /// regenerate the deterministic placeholder locally.
    async fn reload_art(&self, page: &Page) -> Result<PageArt, AppError> {
        match &page.illustration_url {
            Some(url) => {
                let bytes =
                    self.images
                        .fetch(url)
                        .await
                        .map_err(|e| AppError::Illustration {
                            page: page.index as usize,
                            message: e.to_string(),
                        })?;
                Ok(PageArt {
                    url: Some(url.clone()),
                    bytes,
                })
            }
            None => Ok(PageArt {
                url: None,
                bytes: placeholder_png().into(),
            }),
        }
    }

    /// Composition is CPU-bound; run it off the async runtime.
    async fn compose_page(
        &self,
        text: &str,
        art: &PageArt,
        watermark: bool,
    ) -> Result<Vec<u8>, AppError> {
        let composer = Arc::clone(&self.composer);
        let text = text.to_string();
        let bytes = art.bytes.clone();

        let png = tokio::task::spawn_blocking(move || {
            composer.compose(&text, Some(&bytes), watermark)
        })
        .await
        .map_err(|e| AppError::Internal(anyhow!("composition task failed: {e}")))??;

        Ok(png)
    }
}

fn default_title(kind: BookTypeKind, prompts: &PromptSet) -> String {
    match prompts.get("name") {
        Some(name) => format!("{} for {name}", kind.display_name()),
        None => kind.display_name().to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::image_client::ImageError;
    use crate::llm_client::LlmError;
    use crate::payments::PaymentVerification;
    use crate::store::artifacts::MemoryArtifactStore;
    use crate::store::MemoryBookStore;

    struct StubText;

    #[async_trait]
    impl TextGenerator for StubText {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok("Page one text.\n\nPage two text.".to_string())
        }
    }

    /// Generation fails for prompts containing the marker; fetch always
    /// returns a decodable PNG.
    struct StubImages {
        fail_on_marker: &'static str,
    }

    #[async_trait]
    impl ImageGenerator for StubImages {
        async fn generate_image(&self, prompt: &str) -> Result<String, ImageError> {
            if prompt.contains(self.fail_on_marker) {
                return Err(ImageError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(format!("https://img.example/{}.png", prompt.len()))
        }

        async fn fetch(&self, _url: &str) -> Result<Bytes, ImageError> {
            Ok(Bytes::from(placeholder_png()))
        }
    }

    struct StubPayments {
        status: &'static str,
        calls: AtomicUsize,
    }

    impl StubPayments {
        fn succeeding() -> Self {
            Self {
                status: "succeeded",
                calls: AtomicUsize::new(0),
            }
        }

        fn declining() -> Self {
            Self {
                status: "requires_payment_method",
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentVerifier for StubPayments {
        async fn verify_payment(&self, _reference: &str) -> Result<PaymentVerification, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PaymentVerification {
                status: self.status.to_string(),
                amount: 1999,
            })
        }
    }

    #[derive(Default)]
    struct StubPrinter {
        orders: std::sync::Mutex<Vec<PrintOrder>>,
    }

    #[async_trait]
    impl PrintFulfillment for StubPrinter {
        async fn submit_order(&self, order: &PrintOrder) -> Result<PrintOrderReceipt, AppError> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(PrintOrderReceipt {
                order_id: "po-123".to_string(),
                status: "accepted".to_string(),
            })
        }

        async fn order_status(&self, order_id: &str) -> Result<PrintOrderReceipt, AppError> {
            Ok(PrintOrderReceipt {
                order_id: order_id.to_string(),
                status: "accepted".to_string(),
            })
        }
    }

    struct Harness {
        assembler: BookAssembler,
        store: Arc<MemoryBookStore>,
        artifacts: Arc<MemoryArtifactStore>,
        catalog: Arc<Catalog>,
        payments: Arc<StubPayments>,
        printer: Arc<StubPrinter>,
    }

    fn harness_with(
        images: StubImages,
        payments: StubPayments,
        policy: PageFailurePolicy,
    ) -> Harness {
        let store = Arc::new(MemoryBookStore::new());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let catalog = Arc::new(Catalog::with_defaults());
        let payments = Arc::new(payments);
        let printer = Arc::new(StubPrinter::default());

        let assembler = BookAssembler::new(
            Arc::new(StubText),
            Arc::new(images),
            Arc::clone(&payments) as Arc<dyn PaymentVerifier>,
            Arc::clone(&printer) as Arc<dyn PrintFulfillment>,
            Arc::clone(&store) as Arc<dyn BookStore>,
            Arc::clone(&artifacts) as Arc<dyn ArtifactStore>,
            Arc::clone(&catalog),
            Arc::new(PageComposer::default()),
            policy,
        );

        Harness {
            assembler,
            store,
            artifacts,
            catalog,
            payments,
            printer,
        }
    }

    fn harness() -> Harness {
        harness_with(
            StubImages {
                fail_on_marker: "<never>",
            },
            StubPayments::succeeding(),
            PageFailurePolicy::Abort,
        )
    }

    fn mia_request() -> CreateBookRequest {
        CreateBookRequest {
            book_type: "children-story".to_string(),
            title: None,
            prompts: PromptSet::from([
                ("name", "Mia"),
                ("age", "5"),
                ("interests", "dinosaurs"),
                ("favorite_characters", "a brave triceratops"),
            ]),
            owner_id: None,
            on_page_failure: None,
        }
    }

    #[tokio::test]
    async fn test_assemble_creates_watermarked_two_page_preview() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();

        assert_eq!(book.status, BookStatus::Preview);
        assert_eq!(book.pages.len(), 2);
        assert!(book.price_paid_cents.is_none());
        assert!(book.pages.iter().all(|p| p.watermarked));
        assert_eq!(book.pages[0].index, 1);
        assert_eq!(book.pages[1].index, 2);
        assert_eq!(book.pages[0].text, "Page one text.");
        assert_eq!(book.pages[1].text, "Page two text.");

        // Persisted and artifacts uploaded.
        assert!(h.store.load(book.id).await.unwrap().is_some());
        assert_eq!(h.artifacts.len(), 2);
    }

    #[tokio::test]
    async fn test_assemble_rejects_incomplete_prompts_without_saving() {
        let h = harness();
        let mut request = mia_request();
        request.prompts.0.remove("favorite_characters");

        let err = h.assembler.assemble(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(h.store.is_empty().await);
        assert!(h.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_assemble_rejects_unknown_book_type() {
        let h = harness();
        let mut request = mia_request();
        request.book_type = "haiku-collection".to_string();

        let err = h.assembler.assemble(request).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownBookType(_)));
    }

    #[tokio::test]
    async fn test_assemble_rejects_inactive_book_type() {
        let h = harness();
        h.catalog
            .update(BookTypeKind::ChildrenStory, None, None, Some(false))
            .unwrap();

        let err = h.assembler.assemble(mia_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_placeholder_policy_keeps_book_with_substituted_page() {
        let h = harness_with(
            StubImages {
                // "Page two text." reaches the illustration prompt verbatim.
                fail_on_marker: "Page two",
            },
            StubPayments::succeeding(),
            PageFailurePolicy::Placeholder,
        );

        let book = h.assembler.assemble(mia_request()).await.unwrap();
        assert_eq!(book.status, BookStatus::Preview);
        assert_eq!(book.pages.len(), 2);
        assert!(book.pages[0].illustration_url.is_some());
        assert!(
            book.pages[1].illustration_url.is_none(),
            "failed page must use the placeholder"
        );
        assert!(book.pages.iter().all(|p| p.watermarked));
    }

    #[tokio::test]
    async fn test_abort_policy_persists_nothing_on_page_failure() {
        let h = harness_with(
            StubImages {
                fail_on_marker: "Page two",
            },
            StubPayments::succeeding(),
            PageFailurePolicy::Abort,
        );

        let err = h.assembler.assemble(mia_request()).await.unwrap_err();
        assert!(matches!(err, AppError::Illustration { page: 2, .. }));
        assert!(h.store.is_empty().await, "all-or-nothing: nothing saved");
        assert!(h.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_sets_price_current_at_transition_time() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();

        // Admin price change after creation, before purchase.
        h.catalog
            .update(BookTypeKind::ChildrenStory, Some(2599), None, None)
            .unwrap();

        let purchased = h
            .assembler
            .finalize_purchase(book.id, "pi_123")
            .await
            .unwrap();

        assert_eq!(purchased.status, BookStatus::Purchased);
        assert_eq!(purchased.price_paid_cents, Some(2599));
        assert!(purchased.pages.iter().all(|p| !p.watermarked));
    }

    #[tokio::test]
    async fn test_finalize_is_idempotent_and_charges_once() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();

        let first = h
            .assembler
            .finalize_purchase(book.id, "pi_123")
            .await
            .unwrap();

        // Price changes between the two calls must not show up: the second
        // call is a no-op, not a re-purchase.
        h.catalog
            .update(BookTypeKind::ChildrenStory, Some(9999), None, None)
            .unwrap();

        let second = h
            .assembler
            .finalize_purchase(book.id, "pi_123")
            .await
            .unwrap();

        assert_eq!(first.price_paid_cents, second.price_paid_cents);
        assert_eq!(second.status, BookStatus::Purchased);
        assert_eq!(
            h.payments.calls.load(Ordering::SeqCst),
            1,
            "payment verified exactly once"
        );
    }

    #[tokio::test]
    async fn test_finalize_rejects_unsuccessful_payment() {
        let h = harness_with(
            StubImages {
                fail_on_marker: "<never>",
            },
            StubPayments::declining(),
            PageFailurePolicy::Abort,
        );
        let book = h.assembler.assemble(mia_request()).await.unwrap();

        let err = h
            .assembler
            .finalize_purchase(book.id, "pi_123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Payment(_)));

        let stored = h.store.load(book.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookStatus::Preview);
        assert!(stored.price_paid_cents.is_none());
    }

    #[tokio::test]
    async fn test_finalize_missing_book_is_not_found() {
        let h = harness();
        let err = h
            .assembler
            .finalize_purchase(Uuid::new_v4(), "pi_123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    fn shipping() -> ShippingAddress {
        ShippingAddress {
            name: "Mia's Parent".to_string(),
            address1: "1 Main St".to_string(),
            address2: String::new(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62704".to_string(),
            country: "US".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_to_print_rejects_preview_book() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();

        let err = h
            .assembler
            .send_to_print(book.id, shipping())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(h.printer.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_to_print_publishes_purchased_book() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();
        h.assembler
            .finalize_purchase(book.id, "pi_123")
            .await
            .unwrap();

        let receipt = h.assembler.send_to_print(book.id, shipping()).await.unwrap();
        assert_eq!(receipt.order_id, "po-123");

        let stored = h.store.load(book.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookStatus::Published);

        let orders = h.printer.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].book_data.pages.len(), 2);
        assert!(orders[0]
            .book_data
            .pages
            .iter()
            .all(|key| key.ends_with(".final.png")));
    }

    #[tokio::test]
    async fn test_default_title_uses_name_prompt() {
        let h = harness();
        let book = h.assembler.assemble(mia_request()).await.unwrap();
        assert_eq!(book.title, "Children's Bedtime Story for Mia");
    }
}
