//! Book persistence — thin adapters behind the `BookStore` contract.
//!
//! The orchestrator saves a Book only once assembly fully succeeds; a
//! partially generated book never reaches a store.

pub mod artifacts;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::book::{Book, BookStatus};

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn save(&self, book: &Book) -> Result<(), AppError>;
    async fn load(&self, id: Uuid) -> Result<Option<Book>, AppError>;
    /// Full-row update: finalize rewrites status, price, and pages together
    /// so the watermark invariant cannot tear.
    async fn update(&self, book: &Book) -> Result<(), AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    book_type: String,
    owner_id: Option<Uuid>,
    status: String,
    price_paid_cents: Option<i64>,
    pages: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: row.id,
            title: row.title,
            book_type: row.book_type.parse()?,
            owner_id: row.owner_id,
            status: BookStatus::from_str(&row.status).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("invalid book status '{}'", row.status))
            })?,
            price_paid_cents: row.price_paid_cents,
            pages: serde_json::from_value(row.pages)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid pages JSON: {e}")))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn save(&self, book: &Book) -> Result<(), AppError> {
        let pages = serde_json::to_value(&book.pages)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize pages: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO books
                (id, title, book_type, owner_id, status, price_paid_cents, pages,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(book.book_type.slug())
        .bind(book.owner_id)
        .bind(book.status.as_str())
        .bind(book.price_paid_cents)
        .bind(&pages)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<Book>, AppError> {
        let row = sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Book::try_from).transpose()
    }

    async fn update(&self, book: &Book) -> Result<(), AppError> {
        let pages = serde_json::to_value(&book.pages)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize pages: {e}")))?;

        sqlx::query(
            r#"
            UPDATE books
            SET status = $2, price_paid_cents = $3, pages = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(book.id)
        .bind(book.status.as_str())
        .bind(book.price_paid_cents)
        .bind(&pages)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store (tests and local development)
// ────────────────────────────────────────────────────────────────────────────

#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<HashMap<Uuid, Book>>,
}

#[allow(dead_code)]
impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn save(&self, book: &Book) -> Result<(), AppError> {
        self.books.write().await.insert(book.id, book.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Option<Book>, AppError> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn update(&self, book: &Book) -> Result<(), AppError> {
        let mut books = self.books.write().await;
        if !books.contains_key(&book.id) {
            return Err(AppError::NotFound(format!("Book {} not found", book.id)));
        }
        books.insert(book.id, book.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::book_type::BookTypeKind;

    fn sample_book() -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: "Mia and the Dinosaurs".to_string(),
            book_type: BookTypeKind::ChildrenStory,
            owner_id: None,
            status: BookStatus::Preview,
            price_paid_cents: None,
            pages: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_memory_store_save_and_load() {
        let store = MemoryBookStore::new();
        let book = sample_book();
        store.save(&book).await.unwrap();

        let loaded = store.load(book.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, book.id);
        assert_eq!(loaded.status, BookStatus::Preview);
    }

    #[tokio::test]
    async fn test_memory_store_update_requires_existing() {
        let store = MemoryBookStore::new();
        let book = sample_book();
        assert!(matches!(
            store.update(&book).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_load_missing_is_none() {
        let store = MemoryBookStore::new();
        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }
}
