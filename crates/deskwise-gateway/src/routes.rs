//! API route handlers for the gateway.

use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use deskwise_core::error::DeskwiseError;
use deskwise_core::types::{Role, ServiceMode};
use deskwise_engine::AskRequest;

use super::server::AppState;

/// Body of `POST /api/v1/ask`.
#[derive(Debug, Deserialize)]
pub struct AskBody {
    pub question: String,
    pub role: Role,
    #[serde(default)]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Answer a question. Always 200 with `success` in the body — engine
/// failures are already converted into graceful textual answers.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AskBody>,
) -> Json<serde_json::Value> {
    let request = AskRequest {
        question: body.question,
        role: body.role,
        scope_id: body.scope_id,
        session_id: body.session_id,
    };
    match state.engine.answer(request).await {
        Ok(answer) => Json(serde_json::json!({
            "success": true,
            "answer": answer.answer,
            "approach": answer.approach,
            "confidence": answer.confidence,
            "response_time_ms": answer.response_time_ms,
            "from_cache": answer.from_cache,
        })),
        Err(DeskwiseError::Validation(msg)) => {
            Json(serde_json::json!({"success": false, "error": msg}))
        }
        Err(e) => {
            // The engine contract says this cannot happen; log if it does.
            tracing::error!("❌ Unexpected engine error: {e}");
            Json(serde_json::json!({"success": false, "error": "internal error"}))
        }
    }
}

/// Health check endpoint (public).
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mode = state.engine.service_mode();
    let status = match mode {
        ServiceMode::Primary => "healthy",
        ServiceMode::Fallback | ServiceMode::Uninitialized => "degraded",
        ServiceMode::Failed => "error",
    };
    Json(serde_json::json!({
        "status": status,
        "service_mode": mode,
        "service": "deskwise-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// System information endpoint.
pub async fn system_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "platform": format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        "uptime_secs": uptime.as_secs(),
        "service_mode": state.engine.service_mode(),
        "knowledge_entries": state.engine.knowledge().len(),
        "knowledge_loaded_at": state.engine.knowledge().loaded_at(),
        "active_sessions": state.engine.memory().session_count(),
        "gateway": {
            "host": state.gateway_config.host,
            "port": state.gateway_config.port,
            "require_pairing": state.gateway_config.require_pairing,
        }
    }))
}

/// Aggregate engine counters.
pub async fn engine_metrics(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.engine.metrics().snapshot();
    Json(serde_json::json!({
        "success": true,
        "metrics": snapshot,
        "service_mode": state.engine.service_mode(),
    }))
}

/// Active conversation sessions.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sessions = state.engine.memory().list_sessions();
    Json(serde_json::json!({
        "success": true,
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

/// Re-read the knowledge source and rebuild the matching tiers. A failed
/// reload keeps the previous snapshot serving.
pub async fn reload_knowledge(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.engine.reload_knowledge().await {
        Ok(count) => Json(serde_json::json!({
            "success": true,
            "entries": count,
            "service_mode": state.engine.service_mode(),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": e.to_string(),
            "entries": state.engine.knowledge().len(),
        })),
    }
}

/// Knowledge base counts per category.
pub async fn knowledge_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let store = state.engine.knowledge();
    let categories: Vec<serde_json::Value> = store
        .category_counts()
        .into_iter()
        .map(|(category, count)| serde_json::json!({"category": category, "count": count}))
        .collect();
    Json(serde_json::json!({
        "success": true,
        "entries": store.len(),
        "loaded_at": store.loaded_at(),
        "categories": categories,
    }))
}
