//! 远端主机资源与服务状态领域模型

use serde::{Deserialize, Serialize};

/// 资源快照
///
/// 按类别位置对齐的平行数组，一个条目对应一种被监控资源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub categories: Vec<String>,
    pub used: Vec<f64>,
    pub available: Vec<f64>,
    pub units: Vec<String>,
}

/// 服务状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub service: String,
    pub is_installed: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<String>,
}

/// 服务状态查询请求
#[derive(Debug, Deserialize)]
pub struct ServiceQuery {
    pub service: String,
}
