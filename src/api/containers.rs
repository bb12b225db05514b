//! 容器管理 API
//!
//! 包含 /docker/containers 与 /docker/container/* 端点

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::domain::container::{ContainerAction, ContainersResponse};
use crate::error::ApiResult;
use crate::middleware::RequireApiKey;
use crate::services::docker;
use crate::state::AppState;

/// 创建容器管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/docker/containers/:connection_id", get(list_containers))
        .route(
            "/docker/container/:action/:connection_id/:container_ref",
            post(container_action),
        )
}

/// 列出所有容器
///
/// GET /docker/containers/:connection_id
/// 需要 API Key
async fn list_containers(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let containers = docker::list_containers(&conn).await?;
    Ok(Json(ContainersResponse { containers }))
}

/// 驱动容器生命周期
///
/// POST /docker/container/:action/:connection_id/:container_ref
/// action ∈ start | stop | pause | resume | restart | remove
/// 需要 API Key
async fn container_action(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path((action, connection_id, container_ref)): Path<(String, String, String)>,
) -> ApiResult<impl IntoResponse> {
    let action = ContainerAction::parse(&action)?;
    let conn = state.registry.lookup(&connection_id).await?;
    let outcome = docker::container_action(&conn, &container_ref, action).await?;
    Ok(Json(outcome))
}
