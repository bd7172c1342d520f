//! HTTP surface: try-on generation plus the auth endpoints.

pub mod response;
pub mod routes;

use crate::ai::{GeminiImageClient, ImageGenerationService};
use crate::auth::{AuthService, MemoryUserStore, SupabaseUserStore, TokenSigner, UserStore};
use crate::models::{Config, DEFAULT_JWT_SECRET};
use crate::staging::UploadStager;
use crate::tryon::{LookGenerator, LookOptions};
use crate::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub looks: Arc<LookGenerator>,
    pub auth: Arc<AuthService>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(looks: LookGenerator, auth: AuthService, max_upload_bytes: usize) -> Self {
        Self {
            looks: Arc::new(looks),
            auth: Arc::new(auth),
            max_upload_bytes,
        }
    }

    /// Wire the production services described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::new();

        let image_client: Arc<dyn ImageGenerationService> =
            Arc::new(GeminiImageClient::new_with_client(
                config.gemini_api_key.clone().unwrap_or_default(),
                config.image_model.clone(),
                config.vendor_timeout,
                http_client.clone(),
            ));
        info!("Image model: {}", image_client.model());
        info!("Mock AI mode enabled: {}", config.use_mock_ai);

        let store: Arc<dyn UserStore> = match config.supabase() {
            Some((url, key)) => {
                info!("User store: Supabase at {}", url);
                Arc::new(SupabaseUserStore::new_with_client(
                    url.to_string(),
                    key.to_string(),
                    http_client,
                ))
            }
            None => {
                warn!("SUPABASE_URL or SUPABASE_SERVICE_KEY not set, users are kept in memory");
                Arc::new(MemoryUserStore::new())
            }
        };

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET not set, using the built-in development secret");
        }

        let stager = UploadStager::new(&config.upload_dir)?;
        info!("Staging uploads in {}", stager.dir().display());

        Ok(Self::new(
            LookGenerator::new(image_client, stager, LookOptions::from(config)),
            AuthService::new(store, TokenSigner::new(&config.jwt_secret, config.token_ttl)),
            config.max_upload_bytes,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/generate-look",
            post(routes::generate_look).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/auth/register", post(routes::register))
        .route("/api/auth/login", post(routes::login))
        .route("/api/auth/me", get(routes::me))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let address = listener.local_addr()?;
    info!("FitFlick backend running on http://{}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
