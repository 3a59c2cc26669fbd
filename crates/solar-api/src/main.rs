mod config;
mod gemini;
mod routes;

use config::ApiConfig;
use routes::{router, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Solar Layout API");

    let config = ApiConfig::from_env();
    match &config.gemini {
        Some(gemini) => info!("Vision model: {} ({})", gemini.model, gemini.api_url),
        None => warn!("GEMINI_API_KEY not set, analyses will use the deterministic fallback"),
    }

    let bind_addr = config.bind_addr.clone();
    let app = router(AppState::from(config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", bind_addr, e));

    info!("API server listening on http://{}", bind_addr);
    info!("Try: curl http://{}/api/health", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
