//! 基础设施模块
//!
//! SSH 传输与 shell 命令构建

pub mod command;
pub mod ssh;

pub use command::{sh_quote, ShellScript};
pub use ssh::{ExecOutput, SshCredentials, SshError, SshSession};
