//! Illustration Requester — one image per page, fanned out concurrently.
//!
//! Illustration prompts derive from page text, so this stage runs only after
//! narrative generation completes. Requests for different pages are
//! independent: each runs as its own task, failures are attributable to a
//! single page, and results land in a write-once slot per page index.
//! Dropping the assembly future drops the `JoinSet`, which aborts every
//! outstanding request.

use std::sync::Arc;

use anyhow::anyhow;
use bytes::Bytes;
use tokio::task::JoinSet;
use tracing::warn;

use crate::compositor::placeholder_png;
use crate::config::PageFailurePolicy;
use crate::errors::AppError;
use crate::generation::prompts::ILLUSTRATION_TEMPLATE;
use crate::image_client::{ImageError, ImageGenerator};

/// The illustration for one page: the hosted URL (None when the placeholder
/// was substituted) and the raster bytes handed to the compositor.
#[derive(Debug, Clone)]
pub struct PageArt {
    pub url: Option<String>,
    pub bytes: Bytes,
}

impl PageArt {
    fn placeholder() -> Self {
        Self {
            url: None,
            bytes: Bytes::from(placeholder_png()),
        }
    }
}

/// Derives the illustration prompt for one page's text.
pub fn illustration_prompt(page_text: &str) -> String {
    ILLUSTRATION_TEMPLATE.replace("{page_text}", page_text)
}

/// Requests one illustration per page concurrently and waits for all of them.
///
/// Under `PageFailurePolicy::Abort` the first per-page failure fails the
/// whole batch; under `Placeholder` the failed page gets the deterministic
/// placeholder art and assembly continues.
pub async fn request_illustrations(
    images: Arc<dyn ImageGenerator>,
    page_texts: &[String],
    policy: PageFailurePolicy,
) -> Result<Vec<PageArt>, AppError> {
    let mut tasks = JoinSet::new();

    for (index, text) in page_texts.iter().enumerate() {
        let images = Arc::clone(&images);
        let prompt = illustration_prompt(text);
        tasks.spawn(async move {
            let result = generate_and_fetch(images.as_ref(), &prompt).await;
            (index, result)
        });
    }

    // Fan-in barrier: every slot is written exactly once before composition.
    let mut slots: Vec<Option<PageArt>> = vec![None; page_texts.len()];

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.map_err(|e| anyhow!("illustration task panicked: {e}"))?;
        match result {
            Ok((url, bytes)) => {
                slots[index] = Some(PageArt {
                    url: Some(url),
                    bytes,
                });
            }
            Err(e) => match policy {
                PageFailurePolicy::Abort => {
                    // Dropping `tasks` aborts the remaining page requests.
                    return Err(AppError::Illustration {
                        page: index + 1,
                        message: e.to_string(),
                    });
                }
                PageFailurePolicy::Placeholder => {
                    warn!("Illustration for page {} failed ({e}); using placeholder", index + 1);
                    slots[index] = Some(PageArt::placeholder());
                }
            },
        }
    }

    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AppError::Internal(anyhow!("illustration slot left unfilled")))
}

async fn generate_and_fetch(
    images: &dyn ImageGenerator,
    prompt: &str,
) -> Result<(String, Bytes), ImageError> {
    let url = images.generate_image(prompt).await?;
    let bytes = images.fetch(&url).await?;
    Ok((url, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Fails generation for any prompt containing the marker.
    struct FlakyImageGenerator {
        fail_on_marker: &'static str,
    }

    #[async_trait]
    impl ImageGenerator for FlakyImageGenerator {
        async fn generate_image(&self, prompt: &str) -> Result<String, ImageError> {
            if prompt.contains(self.fail_on_marker) {
                return Err(ImageError::Api {
                    status: 500,
                    message: "upstream failure".to_string(),
                });
            }
            Ok(format!("https://img.example/{}", prompt.len()))
        }

        async fn fetch(&self, url: &str) -> Result<Bytes, ImageError> {
            Ok(Bytes::from(format!("bytes-for-{url}")))
        }
    }

    #[test]
    fn test_illustration_prompt_embeds_page_text() {
        let prompt = illustration_prompt("A dinosaur sleeps.");
        assert!(prompt.contains("A dinosaur sleeps."));
        assert!(!prompt.contains("{page_text}"));
    }

    #[tokio::test]
    async fn test_all_pages_get_art_in_order() {
        let images: Arc<dyn ImageGenerator> = Arc::new(FlakyImageGenerator {
            fail_on_marker: "<never>",
        });
        let texts = vec!["one".to_string(), "two two".to_string(), "three".to_string()];
        let art = request_illustrations(images, &texts, PageFailurePolicy::Abort)
            .await
            .unwrap();
        assert_eq!(art.len(), 3);
        assert!(art.iter().all(|a| a.url.is_some()));
    }

    #[tokio::test]
    async fn test_placeholder_policy_substitutes_failed_page() {
        let images: Arc<dyn ImageGenerator> = Arc::new(FlakyImageGenerator {
            fail_on_marker: "two",
        });
        let texts = vec!["one".to_string(), "two".to_string()];
        let art = request_illustrations(images, &texts, PageFailurePolicy::Placeholder)
            .await
            .unwrap();
        assert_eq!(art.len(), 2);
        assert!(art[0].url.is_some());
        assert!(art[1].url.is_none(), "failed page must carry placeholder art");
        assert!(!art[1].bytes.is_empty());
    }

    #[tokio::test]
    async fn test_abort_policy_fails_whole_batch() {
        let images: Arc<dyn ImageGenerator> = Arc::new(FlakyImageGenerator {
            fail_on_marker: "two",
        });
        let texts = vec!["one".to_string(), "two".to_string()];
        let err = request_illustrations(images, &texts, PageFailurePolicy::Abort)
            .await
            .unwrap_err();
        match err {
            AppError::Illustration { page, .. } => assert_eq!(page, 2),
            other => panic!("expected Illustration, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_page_list_yields_empty_art() {
        let images: Arc<dyn ImageGenerator> = Arc::new(FlakyImageGenerator {
            fail_on_marker: "<never>",
        });
        let art = request_illustrations(images, &[], PageFailurePolicy::Abort)
            .await
            .unwrap();
        assert!(art.is_empty());
    }
}
