//! 连接相关领域模型

use serde::{Deserialize, Serialize};

/// 建立连接请求
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    pub host: String,
    pub username: String,
    pub password: String,
    pub owner_id: String,
}

/// 建立连接响应
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub connection_id: String,
}

/// 断开连接响应
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub connection_id: String,
    pub disconnected: bool,
}

/// 执行命令请求
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
}

/// 初始化脚本请求
#[derive(Debug, Deserialize)]
pub struct SetupRequest {
    pub script: String,
}
