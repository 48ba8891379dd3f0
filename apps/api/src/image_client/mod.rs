//! Image-generation client — one illustration request per page.
//!
//! Wraps an OpenAI-style images endpoint: POST a prompt, get back a hosted
//! image URL. Single attempt per call; per-page failures are isolated by the
//! orchestrator, not retried here.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const IMAGE_SIZE: &str = "1024x1024";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("image API returned no image")]
    EmptyResponse,
}

/// Image-generation collaborator contract.
///
/// `generate_image` returns a hosted URL; `fetch` downloads the bytes so the
/// compositor can stay a pure function of its inputs.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<String, ImageError>;
    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError>;
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ImageClient {
    pub fn new(api_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<String, ImageError> {
        let request_body = GenerationRequest {
            prompt,
            n: 1,
            size: IMAGE_SIZE,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerationResponse = response.json().await?;
        let url = parsed
            .data
            .into_iter()
            .next()
            .map(|img| img.url)
            .ok_or(ImageError::EmptyResponse)?;

        debug!("Image generated: {url}");
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Api {
                status: status.as_u16(),
                message: format!("fetching {url}"),
            });
        }
        Ok(response.bytes().await?)
    }
}
