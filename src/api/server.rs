//! 服务器连接与状态 API
//!
//! 包含 /server/* 端点：连接生命周期、命令执行、资源快照、服务状态

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::info;

use crate::domain::connection::{
    ConnectRequest, ConnectResponse, DisconnectResponse, ExecuteRequest, SetupRequest,
};
use crate::domain::server::ServiceQuery;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireApiKey;
use crate::services::executor::{CommandExecutor, SuccessPolicy};
use crate::services::server_status;
use crate::state::AppState;

/// 创建服务器管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/server/connect", post(connect))
        .route("/server/disconnect/:connection_id", delete(disconnect))
        .route("/server/execute/:connection_id", post(execute))
        .route("/server/setup/:connection_id", post(setup))
        .route("/server/status/:connection_id", get(get_server_status))
        .route("/server/service/:connection_id", post(get_service_status))
}

/// 建立 SSH 连接
///
/// POST /server/connect
/// 需要 API Key
async fn connect(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.host.trim().is_empty() || request.username.trim().is_empty() {
        return Err(ApiError::bad_request("host and username are required"));
    }

    let connection_id = state
        .registry
        .connect(
            &request.host,
            &request.username,
            &request.password,
            &request.owner_id,
            state.config.ssh_connect_timeout(),
        )
        .await?;

    Ok(Json(ConnectResponse { connection_id }))
}

/// 断开连接（幂等）
///
/// DELETE /server/disconnect/:connection_id
/// 需要 API Key
async fn disconnect(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let disconnected = state.registry.disconnect(&connection_id).await;
    if !disconnected {
        info!(connection_id = %connection_id, "Disconnect for unknown connection id (no-op)");
    }
    Ok(Json(DisconnectResponse {
        connection_id,
        disconnected,
    }))
}

/// 在持久会话上执行一条命令
///
/// POST /server/execute/:connection_id
/// 需要 API Key
async fn execute(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.command.trim().is_empty() {
        return Err(ApiError::bad_request("command must not be empty"));
    }

    let conn = state.registry.lookup(&connection_id).await?;
    let result =
        CommandExecutor::persistent(&conn, &request.command, SuccessPolicy::Strict).await?;
    Ok(Json(result))
}

/// 在临时会话上执行初始化脚本
///
/// POST /server/setup/:connection_id
/// 需要 API Key
async fn setup(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(request): Json<SetupRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.script.trim().is_empty() {
        return Err(ApiError::bad_request("script must not be empty"));
    }

    let conn = state.registry.lookup(&connection_id).await?;
    // 安装脚本普遍向 stderr 写进度，只按退出码判定
    let result =
        CommandExecutor::ephemeral_checked(&conn, &request.script, SuccessPolicy::ExitOnly).await?;
    Ok(Json(result))
}

/// 资源快照（RAM / CPU / 磁盘）
///
/// GET /server/status/:connection_id
/// 需要 API Key
async fn get_server_status(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let snapshot = server_status::server_status(&conn).await?;
    Ok(Json(snapshot))
}

/// 查询一个系统服务的状态
///
/// POST /server/service/:connection_id
/// 需要 API Key
async fn get_service_status(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<String>,
    Json(query): Json<ServiceQuery>,
) -> ApiResult<impl IntoResponse> {
    let conn = state.registry.lookup(&connection_id).await?;
    let status = server_status::service_status(&conn, &query.service).await?;
    Ok(Json(status))
}
