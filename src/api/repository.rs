//! 仓库管理 API
//!
//! 包含 /repository/* 端点：同步、构建、删除

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use std::sync::Arc;

use crate::domain::repo::{BuildRequest, CloneBundle, DeleteRequest, RepoParams};
use crate::error::ApiResult;
use crate::middleware::RequireApiKey;
use crate::services::{docker, repo_sync};
use crate::state::AppState;

/// 创建仓库管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/repository/clone/:connection_id", post(clone_repository))
        .route("/repository/build/:connection_id", post(build_repository))
        .route(
            "/repository/delete/:connection_id",
            delete(delete_repository),
        )
}

/// clone 或更新仓库
///
/// POST /repository/clone/:connection_id
/// 需要 API Key
async fn clone_repository(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(params): Json<RepoParams>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let (server_path, result) = repo_sync::clone_or_update(
        &conn,
        &params,
        &state.config.repo_base_dir,
        state.config.git_timeout(),
    )
    .await?;

    Ok(Json(CloneBundle {
        server_path,
        pull_status: true,
        result,
    }))
}

/// 同步仓库并构建镜像
///
/// POST /repository/build/:connection_id
/// 需要 API Key
async fn build_repository(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<BuildRequest>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let bundle = docker::build_image(
        &conn,
        &request,
        &state.config.repo_base_dir,
        state.config.git_timeout(),
    )
    .await?;
    Ok(Json(bundle))
}

/// 删除远端路径
///
/// DELETE /repository/delete/:connection_id
/// 需要 API Key
async fn delete_repository(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let bundle = repo_sync::delete_path(&conn, &request.path).await?;
    Ok(Json(bundle))
}
