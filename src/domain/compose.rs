//! 服务编排文档的结构化模型
//!
//! `ServiceDefinition` 是编排文档中一个条目的可编辑表示，
//! 序列化/反序列化逻辑在 `services::compose`

use serde::{Deserialize, Serialize};

/// 环境变量条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 卷挂载条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMapping {
    pub host_path: String,
    pub container_path: String,
}

impl VolumeMapping {
    pub fn new(host_path: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }
}

/// 一个服务定义
///
/// 可选集合为空时在序列化输出中整体省略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_context: Option<String>,
    /// 未显式给出时由 `{base_name}-{service_name}:latest` 合成
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeMapping>,
}

impl ServiceDefinition {
    /// 解析出的镜像标签：显式镜像优先，否则合成默认标签
    pub fn resolved_image(&self, base_name: &str) -> String {
        match &self.image {
            Some(image) if !image.is_empty() => image.clone(),
            _ => format!("{}-{}:latest", base_name, self.service_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_image_default() {
        let def = ServiceDefinition {
            service_name: "api".to_string(),
            build_context: Some(".".to_string()),
            image: None,
            env_file: None,
            ports: vec![],
            environment: vec![],
            volumes: vec![],
        };
        assert_eq!(def.resolved_image("shop"), "shop-api:latest");
    }

    #[test]
    fn test_resolved_image_explicit() {
        let def = ServiceDefinition {
            service_name: "db".to_string(),
            build_context: None,
            image: Some("postgres:16".to_string()),
            env_file: None,
            ports: vec![],
            environment: vec![],
            volumes: vec![],
        };
        assert_eq!(def.resolved_image("shop"), "postgres:16");
    }
}
