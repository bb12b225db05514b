//! 容器与镜像领域模型
//!
//! 容器生命周期状态机在这里定义，转换规则先于远端命令校验

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// 容器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Stopped,
    /// 终态，之后不可再查询
    Removed,
}

impl ContainerState {
    /// 解析 `docker ps --format {{.State}}` 输出的状态字段
    ///
    /// docker 的瞬时状态归入最近的稳定状态：
    /// restarting 视为 Running，removing/dead 视为 Stopped
    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        match raw.trim().to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "running" | "restarting" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "exited" | "stopped" | "dead" | "removing" => Ok(Self::Stopped),
            other => Err(ControlError::parse(
                "container state",
                format!("unknown state '{}'", other),
            )),
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

/// 容器生命周期动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    Start,
    Stop,
    Pause,
    Resume,
    Restart,
    Remove,
}

impl ContainerAction {
    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        match raw {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "restart" => Ok(Self::Restart),
            "remove" => Ok(Self::Remove),
            other => Err(ControlError::Validation(format!(
                "unknown container action '{}'",
                other
            ))),
        }
    }

    /// 动作是否允许从给定状态发起
    ///
    /// start: Created|Stopped -> Running
    /// pause: Running -> Paused
    /// resume: Paused -> Running
    /// stop: Running -> Stopped
    /// restart: 任意非终态 -> Running
    /// remove: Stopped|Created -> Removed
    pub fn allowed_from(&self, state: ContainerState) -> bool {
        use ContainerState::*;
        match self {
            Self::Start => matches!(state, Created | Stopped),
            Self::Stop => matches!(state, Running),
            Self::Pause => matches!(state, Running),
            Self::Resume => matches!(state, Paused),
            Self::Restart => !state.is_terminal(),
            Self::Remove => matches!(state, Stopped | Created),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Restart => "restart",
            Self::Remove => "remove",
        }
    }
}

/// 容器信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub ports: Vec<String>,
    pub state: ContainerState,
    pub status: String,
    pub age: String,
    pub created: String,
}

/// 容器列表响应
#[derive(Debug, Serialize)]
pub struct ContainersResponse {
    pub containers: Vec<ContainerRecord>,
}

/// 镜像使用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageUsage {
    #[serde(rename = "In use")]
    InUse,
    #[serde(rename = "Unused")]
    Unused,
}

/// 镜像信息，使用状态由运行中容器列表交叉推导
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
    pub created: String,
    pub usage: ImageUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

/// 镜像列表响应
#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<ImageRecord>,
}

/// 容器动作请求中的镜像级操作（up / down / rebuild）
#[derive(Debug, Clone, Deserialize)]
pub struct ImageActionRequest {
    pub image_name: String,
    #[serde(default)]
    pub image_id: Option<String>,
    pub server_path: String,
    pub service_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state() {
        assert_eq!(ContainerState::parse("running").unwrap(), ContainerState::Running);
        assert_eq!(ContainerState::parse("Exited").unwrap(), ContainerState::Stopped);
        assert_eq!(ContainerState::parse("created").unwrap(), ContainerState::Created);
        assert_eq!(ContainerState::parse(" paused ").unwrap(), ContainerState::Paused);
        assert!(ContainerState::parse("levitating").is_err());
    }

    #[test]
    fn test_transition_table() {
        use ContainerAction::*;
        use ContainerState::*;

        assert!(Start.allowed_from(Created));
        assert!(Start.allowed_from(Stopped));
        assert!(!Start.allowed_from(Running));

        assert!(Pause.allowed_from(Running));
        assert!(!Pause.allowed_from(Paused));

        assert!(Resume.allowed_from(Paused));
        assert!(!Resume.allowed_from(Running));

        assert!(Stop.allowed_from(Running));
        assert!(!Stop.allowed_from(Stopped));

        assert!(Restart.allowed_from(Created));
        assert!(Restart.allowed_from(Running));
        assert!(Restart.allowed_from(Paused));
        assert!(Restart.allowed_from(Stopped));
        assert!(!Restart.allowed_from(Removed));

        assert!(Remove.allowed_from(Stopped));
        assert!(Remove.allowed_from(Created));
        assert!(!Remove.allowed_from(Running));
        assert!(!Remove.allowed_from(Paused));
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(ContainerAction::parse("resume").unwrap(), ContainerAction::Resume);
        assert!(ContainerAction::parse("explode").is_err());
    }
}
