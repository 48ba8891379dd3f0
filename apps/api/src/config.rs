use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// What to do when a single page's illustration request fails during assembly.
///
/// `Abort` fails the whole assembly; `Placeholder` substitutes the built-in
/// placeholder illustration for that page and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFailurePolicy {
    Abort,
    Placeholder,
}

impl PageFailurePolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "abort" => Ok(PageFailurePolicy::Abort),
            "placeholder" => Ok(PageFailurePolicy::Placeholder),
            other => bail!("ON_PAGE_FAILURE must be 'abort' or 'placeholder', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing — no ambient globals;
/// every collaborator client receives its credentials at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub text_api_key: String,
    pub image_api_key: String,
    pub image_api_url: String,
    pub payment_api_key: String,
    pub payment_api_url: String,
    pub print_api_key: String,
    pub print_api_url: String,
    pub on_page_failure: PageFailurePolicy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            text_api_key: require_env("TEXT_API_KEY")?,
            image_api_key: require_env("IMAGE_API_KEY")?,
            image_api_url: std::env::var("IMAGE_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/images/generations".to_string()),
            payment_api_key: require_env("PAYMENT_API_KEY")?,
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            print_api_key: require_env("PRINT_API_KEY")?,
            print_api_url: require_env("PRINT_API_URL")?,
            on_page_failure: PageFailurePolicy::parse(
                &std::env::var("ON_PAGE_FAILURE").unwrap_or_else(|_| "placeholder".to_string()),
            )?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse_abort() {
        assert_eq!(
            PageFailurePolicy::parse("abort").unwrap(),
            PageFailurePolicy::Abort
        );
    }

    #[test]
    fn test_policy_parse_placeholder() {
        assert_eq!(
            PageFailurePolicy::parse("placeholder").unwrap(),
            PageFailurePolicy::Placeholder
        );
    }

    #[test]
    fn test_policy_parse_rejects_unknown() {
        assert!(PageFailurePolicy::parse("retry").is_err());
    }
}
