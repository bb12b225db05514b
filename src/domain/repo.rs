//! 仓库同步与构建领域模型

use serde::{Deserialize, Serialize};

use super::compose::ServiceDefinition;
use crate::services::executor::CommandResult;

/// 仓库定位与凭证
#[derive(Debug, Clone, Deserialize)]
pub struct RepoParams {
    /// 仓库名，落盘目录名会被净化为 `[A-Za-z0-9_-]`
    pub name: String,
    /// https 仓库地址
    pub github_url: String,
    pub username: String,
    pub fine_grained_token: String,
}

/// clone 结果
#[derive(Debug, Serialize)]
pub struct CloneBundle {
    pub server_path: String,
    pub pull_status: bool,
    pub result: CommandResult,
}

/// 构建请求
#[derive(Debug, Deserialize)]
pub struct BuildRequest {
    #[serde(flatten)]
    pub repo: RepoParams,
    /// 服务定义，非空时生成编排文档写入仓库根
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    /// .env 文件内容
    #[serde(default)]
    pub repo_env: Option<String>,
}

/// 构建结果
///
/// 除执行输出外还带回落盘后的真实服务列表与 env 内容，
/// 调用方看到的是远端磁盘上现在实际存在的东西
#[derive(Debug, Serialize)]
pub struct BuildBundle {
    pub server_path: String,
    pub pull_status: bool,
    pub result: CommandResult,
    pub services: Vec<ServiceDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_content: Option<String>,
}

/// 删除请求
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
}

/// 删除结果：先报告存在性，再尽力删除
#[derive(Debug, Serialize)]
pub struct DeleteBundle {
    pub existed: bool,
    pub result: CommandResult,
}
