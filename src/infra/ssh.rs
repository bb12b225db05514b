//! SSH 客户端会话
//!
//! 基于 russh 的最小客户端封装：密码认证、执行单条命令、
//! stdout/stderr 分离、退出码捕获。凭证可克隆，用于临时会话。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::{ChannelMsg, Disconnect};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// SSH 连接凭证
///
/// 注册表中的每个连接持有一份，临时命令克隆它建立独立会话
#[derive(Clone, Debug)]
pub struct SshCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl SshCredentials {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            password: password.into(),
        }
    }
}

/// SSH 传输错误
#[derive(Debug, Error)]
pub enum SshError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: russh::Error,
    },
    #[error("connection to {host} timed out after {seconds}s")]
    ConnectTimeout { host: String, seconds: u64 },
    #[error("authentication failed for {username}@{host}")]
    AuthFailed { username: String, host: String },
    #[error("session is closed")]
    Closed,
    #[error("transport error: {0}")]
    Transport(#[from] russh::Error),
}

/// 单条命令的执行输出
#[derive(Debug)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// russh 客户端 Handler
///
/// 主机为租户自报的地址，无已知主机库可查，服务端公钥直接接受
struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// 一个已认证的 SSH 会话
///
/// 持久模式下传输句柄由 Mutex 串行化：并发调用会依次执行，顺序不保证
pub struct SshSession {
    handle: Mutex<client::Handle<ClientHandler>>,
    closed: AtomicBool,
    host: String,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("host", &self.host)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl SshSession {
    /// 建立并认证一个新会话
    pub async fn connect(creds: &SshCredentials, timeout: Duration) -> Result<Self, SshError> {
        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let addr = (creds.host.as_str(), creds.port);
        let connect = client::connect(config, addr, ClientHandler);
        let mut handle = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| SshError::ConnectTimeout {
                host: creds.host.clone(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|e| SshError::Connect {
                host: creds.host.clone(),
                source: e,
            })?;

        let authenticated = handle
            .authenticate_password(creds.username.clone(), creds.password.clone())
            .await?;
        if !authenticated {
            return Err(SshError::AuthFailed {
                username: creds.username.clone(),
                host: creds.host.clone(),
            });
        }

        debug!(host = %creds.host, username = %creds.username, "SSH session established");

        Ok(Self {
            handle: Mutex::new(handle),
            closed: AtomicBool::new(false),
            host: creds.host.clone(),
        })
    }

    /// 执行一条命令，等待通道关闭后返回完整输出
    ///
    /// 未收到退出状态时按 -1 处理，交由上层成功策略判定
    pub async fn exec(&self, command: &str) -> Result<ExecOutput, SshError> {
        if self.is_closed() {
            return Err(SshError::Closed);
        }

        let mut handle = self.handle.lock().await;
        let mut channel = handle.channel_open_session().await?;
        channel.exec(true, command).await?;

        let mut stdout: Vec<u8> = Vec::new();
        let mut stderr: Vec<u8> = Vec::new();
        let mut exit_code: Option<i32> = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => {
                    stdout.extend_from_slice(data);
                }
                ChannelMsg::ExtendedData { ref data, ext } if ext == 1 => {
                    stderr.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(exit_status as i32);
                }
                _ => {}
            }
        }

        if exit_code.is_none() {
            warn!(host = %self.host, "channel closed without exit status");
        }

        Ok(ExecOutput {
            exit_code: exit_code.unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// 关闭会话，重复关闭为 no-op
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut handle = self.handle.lock().await;
        if let Err(e) = handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(host = %self.host, error = %e, "disconnect returned error");
        }
    }

    /// 会话是否已被关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
