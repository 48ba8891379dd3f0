//! Rendered-page artifact storage (S3 / MinIO).
//!
//! Preview and unlocked renders of the same page use distinct keys so a
//! purchase never overwrites the watermarked artifact mid-request.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use uuid::Uuid;

use crate::errors::AppError;

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Uploads one rendered page PNG and returns its object key.
    async fn put_page(
        &self,
        book_id: Uuid,
        index: u32,
        watermarked: bool,
        bytes: Vec<u8>,
    ) -> Result<String, AppError>;
}

pub fn page_key(book_id: Uuid, index: u32, watermarked: bool) -> String {
    let variant = if watermarked { "preview" } else { "final" };
    format!("books/{book_id}/pages/{index:03}.{variant}.png")
}

pub struct S3ArtifactStore {
    client: S3Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put_page(
        &self,
        book_id: Uuid,
        index: u32,
        watermarked: bool,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let key = page_key(book_id, index, watermarked);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type("image/png")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(key)
    }
}

/// In-memory artifact store for tests.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryArtifactStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[allow(dead_code)]
impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().expect("artifact lock").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("artifact lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put_page(
        &self,
        book_id: Uuid,
        index: u32,
        watermarked: bool,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let key = page_key(book_id, index, watermarked);
        self.objects
            .lock()
            .expect("artifact lock")
            .insert(key.clone(), bytes);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_key_separates_preview_and_final() {
        let id = Uuid::new_v4();
        let preview = page_key(id, 1, true);
        let unlocked = page_key(id, 1, false);
        assert_ne!(preview, unlocked);
        assert!(preview.ends_with("001.preview.png"));
        assert!(unlocked.ends_with("001.final.png"));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryArtifactStore::new();
        let id = Uuid::new_v4();
        let key = store.put_page(id, 2, true, vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get(&key), Some(vec![1, 2, 3]));
    }
}
