//! 命令执行器
//!
//! 两种执行模式：
//! - 持久模式：复用注册表中的会话，命令经共享传输串行执行
//! - 临时模式：克隆凭证建立独立会话，只执行一条命令，
//!   所有退出路径都释放该会话
//!
//! 成功与否由调用点选择的策略显式判定，绝不在下游隐式推断

use serde::Serialize;
use tracing::debug;

use crate::error::ControlError;
use crate::infra::ssh::{ExecOutput, SshError, SshSession};
use crate::state::connection_registry::Connection;

/// 成功策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// 退出码为 0 即成功（docker/git 常向 stderr 写进度）
    ExitOnly,
    /// 退出码为 0 且 stderr 为空才算成功，用于状态变更类命令
    Strict,
}

impl SuccessPolicy {
    pub fn evaluate(&self, exit_code: i32, stderr: &str) -> bool {
        match self {
            Self::ExitOnly => exit_code == 0,
            Self::Strict => exit_code == 0 && stderr.trim().is_empty(),
        }
    }
}

/// 命令执行结果
///
/// 成功标志是策略的显式计算结果，随结果一起携带
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CommandResult {
    fn from_output(output: ExecOutput, policy: SuccessPolicy) -> Self {
        let stdout = output.stdout.trim().to_string();
        let stderr = output.stderr.trim_end().to_string();
        let success = policy.evaluate(output.exit_code, &stderr);
        Self {
            exit_code: output.exit_code,
            stdout,
            stderr,
            success,
        }
    }

    /// 失败时转为 `CommandFailed` 错误，携带退出码与原始诊断
    pub fn checked(self) -> Result<Self, ControlError> {
        if self.success {
            Ok(self)
        } else {
            let diagnostics = if self.stderr.is_empty() {
                self.stdout.clone()
            } else {
                self.stderr.clone()
            };
            Err(ControlError::CommandFailed {
                exit_code: self.exit_code,
                stderr: diagnostics,
            })
        }
    }
}

/// 命令执行器
pub struct CommandExecutor;

impl CommandExecutor {
    /// 持久模式执行
    pub async fn persistent(
        conn: &Connection,
        command: &str,
        policy: SuccessPolicy,
    ) -> Result<CommandResult, ControlError> {
        debug!(connection_id = %conn.id, command = %command, "Executing (persistent)");
        let output = conn
            .session
            .exec(command)
            .await
            .map_err(map_transport_error)?;
        Ok(CommandResult::from_output(output, policy))
    }

    /// 持久模式执行，失败即报错
    pub async fn persistent_checked(
        conn: &Connection,
        command: &str,
        policy: SuccessPolicy,
    ) -> Result<CommandResult, ControlError> {
        Self::persistent(conn, command, policy).await?.checked()
    }

    /// 临时模式执行
    ///
    /// 克隆连接凭证建立一次性会话，执行完毕无论成败都关闭
    pub async fn ephemeral(
        conn: &Connection,
        command: &str,
        policy: SuccessPolicy,
    ) -> Result<CommandResult, ControlError> {
        debug!(connection_id = %conn.id, command = %command, "Executing (ephemeral)");
        let session = SshSession::connect(&conn.credentials, conn.connect_timeout)
            .await
            .map_err(|e| ControlError::Connection(e.to_string()))?;

        let outcome = session.exec(command).await;
        session.close().await;

        let output = outcome.map_err(map_transport_error)?;
        Ok(CommandResult::from_output(output, policy))
    }

    /// 临时模式执行，失败即报错
    pub async fn ephemeral_checked(
        conn: &Connection,
        command: &str,
        policy: SuccessPolicy,
    ) -> Result<CommandResult, ControlError> {
        Self::ephemeral(conn, command, policy).await?.checked()
    }
}

fn map_transport_error(err: SshError) -> ControlError {
    match err {
        SshError::Closed => ControlError::NotFound("Connection".to_string()),
        other => ControlError::Connection(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> ExecOutput {
        ExecOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_exit_only_policy() {
        assert!(SuccessPolicy::ExitOnly.evaluate(0, "warning: stuff"));
        assert!(!SuccessPolicy::ExitOnly.evaluate(1, ""));
    }

    #[test]
    fn test_strict_policy() {
        assert!(SuccessPolicy::Strict.evaluate(0, ""));
        assert!(SuccessPolicy::Strict.evaluate(0, "  \n"));
        assert!(!SuccessPolicy::Strict.evaluate(0, "warning"));
        assert!(!SuccessPolicy::Strict.evaluate(1, ""));
    }

    #[test]
    fn test_result_trims_stdout() {
        let result = CommandResult::from_output(
            output(0, "  abc123\n", ""),
            SuccessPolicy::Strict,
        );
        assert_eq!(result.stdout, "abc123");
        assert!(result.success);
    }

    #[test]
    fn test_checked_success_passthrough() {
        let result = CommandResult::from_output(output(0, "ok", ""), SuccessPolicy::Strict);
        assert!(result.checked().is_ok());
    }

    #[test]
    fn test_checked_failure_carries_stderr() {
        let result = CommandResult::from_output(
            output(125, "", "docker: no such container\n"),
            SuccessPolicy::ExitOnly,
        );
        let err = result.checked().unwrap_err();
        match err {
            ControlError::CommandFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 125);
                assert_eq!(stderr, "docker: no such container");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_checked_failure_falls_back_to_stdout() {
        // stderr 为空时用 stdout 充当诊断文本
        let result = CommandResult::from_output(output(2, "usage: thing", ""), SuccessPolicy::ExitOnly);
        let err = result.checked().unwrap_err();
        match err {
            ControlError::CommandFailed { stderr, .. } => assert_eq!(stderr, "usage: thing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
