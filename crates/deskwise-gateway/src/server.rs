//! HTTP server implementation using Axum.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use deskwise_core::config::{DeskwiseConfig, GatewayConfig};
use deskwise_engine::AnswerEngine;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub gateway_config: GatewayConfig,
    pub start_time: std::time::Instant,
    pub pairing_code: Option<String>,
    /// The answer engine — matching tiers, cache, memory, metrics.
    pub engine: Arc<AnswerEngine>,
}

/// Pairing code auth middleware — validates X-Pairing-Code header or ?code= query.
async fn require_pairing(
    State(state): State<Arc<AppState>>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    // If no pairing code configured, allow all
    let Some(expected) = &state.pairing_code else {
        return next.run(req).await;
    };

    let from_header = req
        .headers()
        .get("X-Pairing-Code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if from_header == expected {
        return next.run(req).await;
    }

    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some(code) = pair.strip_prefix("code=") {
                if code == expected {
                    return next.run(req).await;
                }
            }
        }
    }

    axum::response::Response::builder()
        .status(axum::http::StatusCode::UNAUTHORIZED)
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"success": false, "error": "Unauthorized — invalid or missing pairing code"})
                .to_string(),
        ))
        .unwrap()
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    // Admin surface — requires valid pairing code
    let protected = Router::new()
        .route("/api/v1/info", get(super::routes::system_info))
        .route("/api/v1/metrics", get(super::routes::engine_metrics))
        .route("/api/v1/sessions", get(super::routes::list_sessions))
        .route(
            "/api/v1/knowledge/reload",
            post(super::routes::reload_knowledge),
        )
        .route(
            "/api/v1/knowledge/stats",
            get(super::routes::knowledge_stats),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            shared.clone(),
            require_pairing,
        ));

    // Public routes — no auth
    let public = Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/v1/ask", post(super::routes::ask));

    protected
        .merge(public)
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: &DeskwiseConfig) -> anyhow::Result<()> {
    let engine = AnswerEngine::from_config(config);
    tracing::info!(
        "🤖 Answer engine initialized ({} entries, mode {})",
        engine.knowledge().len(),
        engine.service_mode()
    );

    // Background sweepers: expired cache entries and idle sessions.
    engine.cache().spawn_sweeper(std::time::Duration::from_secs(
        config.cache.sweep_interval_secs,
    ));
    engine.memory().spawn_sweeper(std::time::Duration::from_secs(
        config.memory.sweep_interval_secs,
    ));

    let pairing_code = if config.gateway.require_pairing {
        std::env::var("DESKWISE_PAIRING_CODE").ok().or_else(|| {
            let pc = DeskwiseConfig::home_dir().join(".pairing_code");
            std::fs::read_to_string(pc).ok().map(|s| s.trim().to_string())
        })
    } else {
        None
    };

    let state = AppState {
        gateway_config: config.gateway.clone(),
        start_time: std::time::Instant::now(),
        pairing_code,
        engine,
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
