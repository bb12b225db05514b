//! 运行时状态模块

pub mod app_state;
pub mod connection_registry;

pub use app_state::{get_shutdown_token, trigger_shutdown, AppState};
pub use connection_registry::{Connection, ConnectionRegistry};
