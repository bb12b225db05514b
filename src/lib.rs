//! Dockfleet - 多租户 docker 主机控制面
//!
//! 通过 SSH 管理一组远程主机：建立会话、执行管理命令、
//! 将命令行输出转换为结构化记录

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod services;
pub mod state;

use std::sync::Arc;

use tracing::info;

use crate::state::{get_shutdown_token, AppState};

/// 运行时配置（命令行覆盖）
#[derive(Debug, Default, Clone)]
pub struct RuntimeConfig {
    pub port_override: Option<u16>,
}

/// 初始化并运行服务
///
/// 进程内不持久化任何状态：连接表随进程消失，
/// 调用方重启后需要重新 connect
pub async fn init_and_run(runtime: RuntimeConfig) -> anyhow::Result<()> {
    init_tracing();

    let state = Arc::new(AppState::new());
    let port = runtime.port_override.unwrap_or(state.config.port);
    let addr = format!("0.0.0.0:{}", port);

    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "dockfleet listening");

    let shutdown = get_shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        })
        .await?;

    // 关停时统一释放所有会话
    state.registry.close_all().await;
    info!("Shutdown complete");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
