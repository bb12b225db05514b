//! 镜像管理 API
//!
//! 包含 /docker/images 与 /docker/image/* 端点

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::domain::container::{ImageActionRequest, ImagesResponse};
use crate::error::ApiResult;
use crate::middleware::RequireApiKey;
use crate::services::docker;
use crate::state::AppState;

/// 创建镜像管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/docker/images/:connection_id", get(list_images))
        .route("/docker/image/up/:connection_id", post(image_up))
        .route("/docker/image/down/:connection_id", post(image_down))
        .route("/docker/image/rebuild/:connection_id", post(image_rebuild))
}

/// 列出镜像及其使用状态
///
/// GET /docker/images/:connection_id
/// 需要 API Key
async fn list_images(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let images = docker::list_images(&conn).await?;
    Ok(Json(ImagesResponse { images }))
}

/// 启动服务，返回镜像的权威快照
///
/// POST /docker/image/up/:connection_id
/// 需要 API Key
async fn image_up(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<ImageActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let image = docker::service_up(&conn, &request).await?;
    Ok(Json(image))
}

/// 停止服务，返回镜像的权威快照
///
/// POST /docker/image/down/:connection_id
/// 需要 API Key
async fn image_down(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<ImageActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let image = docker::service_down(&conn, &request).await?;
    Ok(Json(image))
}

/// 重建并重启服务
///
/// POST /docker/image/rebuild/:connection_id
/// 需要 API Key
async fn image_rebuild(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<ImageActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let image = docker::service_rebuild(&conn, &request).await?;
    Ok(Json(image))
}
