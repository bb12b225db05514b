//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod compose;
pub mod connection;
pub mod container;
pub mod repo;
pub mod server;

// Re-exports for convenience
pub use compose::{EnvEntry, ServiceDefinition, VolumeMapping};
pub use connection::{ConnectRequest, ConnectResponse};
pub use container::{ContainerAction, ContainerRecord, ContainerState, ImageRecord, ImageUsage};
pub use server::{ResourceSnapshot, ServiceStatus};
