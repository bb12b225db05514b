//! 健康检查 API
//!
//! 包含 /health 端点

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::{SERVICE_NAME, VERSION};
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    started_at: String,
    active_connections: usize,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// 健康检查 - 返回状态、版本与存活连接数
///
/// GET /health
/// 无需认证
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let active_connections = state.registry.len().await;

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        timestamp: chrono::Utc::now().to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
        active_connections,
    })
}
