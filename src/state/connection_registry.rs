//! 连接注册表
//!
//! 持有所有存活的远程会话，按连接标识增删查；
//! 注册表是会话的唯一所有者，关停时统一释放

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::ControlError;
use crate::infra::ssh::{SshCredentials, SshSession};

/// 一个受管连接
///
/// 凭证保留一份用于克隆临时会话
#[derive(Debug)]
pub struct Connection {
    pub id: String,
    pub credentials: SshCredentials,
    pub session: SshSession,
    /// 临时会话沿用建立本连接时的超时
    pub connect_timeout: Duration,
}

/// 连接注册表
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// 连接标识：由租户、主机、用户名确定性合成，无随机成分
    ///
    /// 相同输入重复 connect 得到同一标识
    pub fn connection_id(owner_id: &str, host: &str, username: &str) -> String {
        format!("{}_{}_{}", owner_id, host, username)
    }

    /// 建立新会话并登记
    ///
    /// 同一标识已存在时先关闭旧会话再替换，调用方拿到的标识不变
    pub async fn connect(
        &self,
        host: &str,
        username: &str,
        password: &str,
        owner_id: &str,
        connect_timeout: Duration,
    ) -> Result<String, ControlError> {
        let credentials = SshCredentials::new(host, username, password);
        let session = SshSession::connect(&credentials, connect_timeout)
            .await
            .map_err(|e| ControlError::Connection(e.to_string()))?;

        let id = Self::connection_id(owner_id, host, username);
        let connection = Arc::new(Connection {
            id: id.clone(),
            credentials,
            session,
            connect_timeout,
        });

        let previous = {
            let mut connections = self.connections.write().await;
            connections.insert(id.clone(), connection)
        };
        if let Some(old) = previous {
            warn!(connection_id = %id, "Replacing existing session for connection id");
            old.session.close().await;
        }

        info!(connection_id = %id, host = %host, "SSH connection registered");
        Ok(id)
    }

    /// 查找存活连接
    pub async fn lookup(&self, connection_id: &str) -> Result<Arc<Connection>, ControlError> {
        let connections = self.connections.read().await;
        match connections.get(connection_id) {
            Some(conn) if !conn.session.is_closed() => Ok(conn.clone()),
            _ => Err(ControlError::NotFound(format!(
                "Connection '{}'",
                connection_id
            ))),
        }
    }

    /// 释放会话并移除表项
    ///
    /// 幂等：标识不存在或已移除时返回 false，不是错误
    pub async fn disconnect(&self, connection_id: &str) -> bool {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(connection_id)
        };
        match removed {
            Some(conn) => {
                conn.session.close().await;
                info!(connection_id = %connection_id, "SSH connection closed");
                true
            }
            None => false,
        }
    }

    /// 存活连接数
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// 关停：关闭所有会话并清空表
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Connection>> = {
            let mut connections = self.connections.write().await;
            connections.drain().map(|(_, c)| c).collect()
        };
        let count = drained.len();
        for conn in drained {
            conn.session.close().await;
        }
        if count > 0 {
            info!(count = count, "Closed all SSH connections on shutdown");
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_is_deterministic() {
        let a = ConnectionRegistry::connection_id("tenant-1", "10.0.0.5", "deploy");
        let b = ConnectionRegistry::connection_id("tenant-1", "10.0.0.5", "deploy");
        assert_eq!(a, b);
        assert_eq!(a, "tenant-1_10.0.0.5_deploy");
    }

    #[test]
    fn test_connection_id_varies_by_parts() {
        let a = ConnectionRegistry::connection_id("t1", "h", "u");
        let b = ConnectionRegistry::connection_id("t2", "h", "u");
        let c = ConnectionRegistry::connection_id("t1", "h2", "u");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_disconnect_unknown_id_is_noop() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.disconnect("nobody_home_here").await);
        // 再次断开同样不是错误
        assert!(!registry.disconnect("nobody_home_here").await);
    }

    #[tokio::test]
    async fn test_lookup_unknown_id_fails() {
        let registry = ConnectionRegistry::new();
        let err = registry.lookup("missing").await.unwrap_err();
        assert!(matches!(err, ControlError::NotFound(_)));
    }
}
