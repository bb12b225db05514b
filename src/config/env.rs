//! 环境变量配置加载

use std::env;
use std::time::Duration;
use tracing::warn;

/// 配置常量
pub mod constants {
    /// 服务版本
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    /// 服务名
    pub const SERVICE_NAME: &str = "dockfleet";
}

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// API 密钥
    pub api_key: String,
    /// 服务监听端口
    pub port: u16,
    /// SSH 连接超时（秒）
    pub ssh_connect_timeout_secs: u64,
    /// git clone / pull 超时（秒）
    pub git_timeout_secs: u64,
    /// 远端仓库基础目录
    pub repo_base_dir: String,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        // API Key - 支持旧名称兼容
        let api_key = load_with_fallback("DOCKFLEET_API_KEY", "API_KEY")
            .unwrap_or_else(|| "change-me-in-production".to_string());
        if env::var("API_KEY").is_ok() {
            warn!("Deprecated environment variable API_KEY detected. Please use DOCKFLEET_API_KEY");
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9400);

        let ssh_connect_timeout_secs = env::var("SSH_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let git_timeout_secs = env::var("GIT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let repo_base_dir = env::var("REPO_BASE_DIR").unwrap_or_else(|_| "projects".to_string());

        Self {
            api_key,
            port,
            ssh_connect_timeout_secs,
            git_timeout_secs,
            repo_base_dir,
        }
    }

    /// SSH 连接超时
    pub fn ssh_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_connect_timeout_secs)
    }

    /// git 操作超时
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}

/// 按优先级读取环境变量（新名称优先，旧名称兼容）
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| env::var(fallback).ok().filter(|v| !v.is_empty()))
}
