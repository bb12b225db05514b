//! 核心服务模块
//!
//! 命令执行、输出解析、编排文档模型、仓库同步与容器编排用例

pub mod compose;
pub mod docker;
pub mod executor;
pub mod parsers;
pub mod repo_sync;
pub mod server_status;
