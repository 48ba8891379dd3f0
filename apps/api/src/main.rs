mod compositor;
mod config;
mod db;
mod errors;
mod generation;
mod image_client;
mod llm_client;
mod models;
mod payments;
mod publishing;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compositor::PageComposer;
use crate::config::Config;
use crate::db::create_pool;
use crate::generation::catalog::Catalog;
use crate::generation::orchestrator::BookAssembler;
use crate::image_client::ImageClient;
use crate::llm_client::LlmClient;
use crate::payments::PaymentClient;
use crate::publishing::PrintClient;
use crate::publishing::PrintFulfillment;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::artifacts::S3ArtifactStore;
use crate::store::{BookStore, PgBookStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("memora_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memora API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store: Arc<dyn BookStore> = Arc::new(PgBookStore::new(pool));

    // Initialize S3 / MinIO artifact storage
    let s3 = build_s3_client(&config).await;
    let artifacts = Arc::new(S3ArtifactStore::new(s3, config.s3_bucket.clone()));
    info!("S3 artifact store initialized (bucket: {})", config.s3_bucket);

    // Collaborator clients — credentials injected here, no ambient key state
    let text_gen = Arc::new(LlmClient::new(config.text_api_key.clone())?);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let images = Arc::new(ImageClient::new(
        config.image_api_url.clone(),
        config.image_api_key.clone(),
    )?);
    let payments = Arc::new(PaymentClient::new(
        config.payment_api_url.clone(),
        config.payment_api_key.clone(),
    )?);
    let printer: Arc<dyn PrintFulfillment> = Arc::new(PrintClient::new(
        config.print_api_url.clone(),
        config.print_api_key.clone(),
    )?);

    // Pricing catalog and page composer
    let catalog = Arc::new(Catalog::with_defaults());
    let composer = Arc::new(PageComposer::default());
    info!("Page failure policy: {:?}", config.on_page_failure);

    // Assembly pipeline
    let assembler = Arc::new(BookAssembler::new(
        text_gen,
        images,
        payments,
        Arc::clone(&printer),
        Arc::clone(&store),
        artifacts,
        Arc::clone(&catalog),
        composer,
        config.on_page_failure,
    ));

    // Build app state
    let state = AppState {
        assembler,
        store,
        catalog,
        printer,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "memora-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
