//! 应用状态

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;

use super::connection_registry::ConnectionRegistry;

/// 全局 shutdown token，用于优雅关闭所有后台任务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

/// 应用状态
///
/// 进程内唯一的共享可变状态是连接注册表，
/// 其余均为启动时固化的配置
pub struct AppState {
    /// API 密钥（用于验证请求）
    pub api_key: String,
    /// 环境配置
    pub config: EnvConfig,
    /// 连接注册表
    pub registry: ConnectionRegistry,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new() -> Self {
        let config = EnvConfig::from_env();

        tracing::info!(
            api_key_len = config.api_key.len(),
            port = config.port,
            ssh_connect_timeout_secs = config.ssh_connect_timeout_secs,
            git_timeout_secs = config.git_timeout_secs,
            repo_base_dir = %config.repo_base_dir,
            "Loaded configuration"
        );

        Self {
            api_key: config.api_key.clone(),
            registry: ConnectionRegistry::new(),
            started_at: Utc::now(),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
