//! HTTP route definitions

use axum::{
    extract::{Query, State},
    http::Method,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::GamePhase;
use crate::store::HistoryEntry;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/history", get(history_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    connected_clients: usize,
    hot_potato: HotPotatoStatus,
}

#[derive(Serialize)]
struct HotPotatoStatus {
    phase: GamePhase,
    participants: usize,
    cooldown_remaining_secs: Option<u64>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        connected_clients: state.clients.len(),
        hot_potato: HotPotatoStatus {
            phase: state.hot_potato.phase(),
            participants: state.hot_potato.participant_count(),
            cooldown_remaining_secs: state.hot_potato.cooldown_remaining(),
        },
    })
}

// ============================================================================
// History endpoint
// ============================================================================

const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HistoryResponse {
    entries: Vec<HistoryEntry>,
}

async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(HistoryResponse {
        entries: state.clients.history().recent(limit),
    })
}
