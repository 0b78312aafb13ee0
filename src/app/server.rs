use crate::adapters::gemini::gateway_from_config;
use crate::app::handlers;
use crate::config::toml_config::AppConfig;
use crate::core::catalog::Catalog;
use crate::core::checkout::PaymentProcessor;
use crate::core::prescription::PrescriptionService;
use crate::domain::ports::ExtractionGateway;
use crate::utils::error::{PharmacyError, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// 上傳檔案外的 multipart 額外開銷
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub prescriptions: PrescriptionService,
    pub payment: PaymentProcessor,
    /// 設定中的單檔上限，回報給使用者用
    pub max_upload_bytes: usize,
    /// 整個請求的上限，含 multipart 開銷
    pub body_limit: usize,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        catalog: Arc<Catalog>,
        gateway: Arc<dyn ExtractionGateway>,
    ) -> Self {
        let prescriptions = PrescriptionService::new(catalog.clone(), gateway)
            .with_upload_policy(config.upload.clone())
            .with_options(config.matching);

        Self {
            catalog,
            prescriptions,
            payment: PaymentProcessor::from_config(&config.payment),
            max_upload_bytes: config.upload.max_size_bytes(),
            body_limit: config.upload.max_size_bytes() + MULTIPART_OVERHEAD_BYTES,
        }
    }

    /// Builds the catalog and the Gemini gateway from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let catalog = match config.catalog_path() {
            Some(path) => {
                tracing::info!("📁 Loading catalog from: {}", path);
                Catalog::from_toml_file(path)?
            }
            None => Catalog::sample(),
        };
        tracing::info!("Catalog ready with {} medicines", catalog.len());

        let gateway = gateway_from_config(&config.gemini)?;
        Ok(Self::new(config, Arc::new(catalog), gateway))
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/medicines", get(handlers::list_medicines))
        .route("/api/medicines/:id", get(handlers::get_medicine))
        .route(
            "/api/process-prescription",
            post(handlers::process_prescription),
        )
        .route("/api/cart", post(handlers::quote_cart))
        .route("/api/payment", post(handlers::pay))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = AppState::from_config(config)?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("🚀 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(PharmacyError::IoError)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
