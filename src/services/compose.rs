//! 编排文档模型
//!
//! 结构化服务定义与编排文档文本之间的双向转换。
//! 往返律：serialize(deserialize(x)) 在镜像、端口、环境变量、卷、
//! 构建上下文、env 文件引用上语义等价，空白与键序差异可接受

use serde_yaml::{Mapping, Value};

use crate::domain::compose::{EnvEntry, ServiceDefinition, VolumeMapping};
use crate::error::ControlError;

/// 文档内的编排文件名
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// 序列化服务定义为编排文档
///
/// 未显式给镜像的服务合成 `{base_name}-{service_name}:latest`；
/// ports / volumes / environment 为空时整节省略，
/// 生成的文档在往返下保持最小且稳定
pub fn serialize(services: &[ServiceDefinition], base_name: &str) -> Result<String, ControlError> {
    let mut seen = std::collections::HashSet::new();
    for def in services {
        if def.service_name.trim().is_empty() {
            return Err(ControlError::Validation(
                "service name must not be empty".to_string(),
            ));
        }
        if !seen.insert(def.service_name.as_str()) {
            return Err(ControlError::Validation(format!(
                "duplicate service name '{}'",
                def.service_name
            )));
        }
    }

    let mut services_map = Mapping::new();
    for def in services {
        let mut svc = Mapping::new();

        if let Some(context) = def.build_context.as_deref().filter(|c| !c.is_empty()) {
            let mut build = Mapping::new();
            build.insert("context".into(), Value::String(context.to_string()));
            svc.insert("build".into(), Value::Mapping(build));
        }

        svc.insert("image".into(), Value::String(def.resolved_image(base_name)));

        if let Some(env_file) = def.env_file.as_deref().filter(|f| !f.is_empty()) {
            svc.insert("env_file".into(), Value::String(env_file.to_string()));
        }

        if !def.ports.is_empty() {
            svc.insert("ports".into(), string_sequence(def.ports.iter().cloned()));
        }
        if !def.environment.is_empty() {
            svc.insert(
                "environment".into(),
                string_sequence(
                    def.environment
                        .iter()
                        .map(|e| format!("{}={}", e.key, e.value)),
                ),
            );
        }
        if !def.volumes.is_empty() {
            svc.insert(
                "volumes".into(),
                string_sequence(
                    def.volumes
                        .iter()
                        .map(|v| format!("{}:{}", v.host_path, v.container_path)),
                ),
            );
        }

        services_map.insert(Value::String(def.service_name.clone()), Value::Mapping(svc));
    }

    let mut root = Mapping::new();
    root.insert("services".into(), Value::Mapping(services_map));

    serde_yaml::to_string(&Value::Mapping(root))
        .map_err(|e| ControlError::parse("compose document", e.to_string()))
}

/// 从编排文档文本还原服务定义
///
/// `KEY=VALUE` 在首个 `=` 处拆开一次，`host:container` 在首个 `:` 处
/// 拆开一次；缺失的可选节产出空列表。保留文档内的服务顺序
pub fn deserialize(document: &str) -> Result<Vec<ServiceDefinition>, ControlError> {
    let root: Value = serde_yaml::from_str(document)
        .map_err(|e| ControlError::parse("compose document", e.to_string()))?;

    let services = root
        .get("services")
        .and_then(Value::as_mapping)
        .ok_or_else(|| ControlError::parse("compose document", "missing 'services' mapping"))?;

    let mut defs = Vec::with_capacity(services.len());
    for (name, body) in services {
        let service_name = name
            .as_str()
            .ok_or_else(|| ControlError::parse("compose document", "non-string service name"))?
            .to_string();
        let body = body.as_mapping();

        let image = body
            .and_then(|m| field_str(m, "image"))
            .map(str::to_string);
        let build_context = body
            .and_then(|m| field(m, "build"))
            .and_then(|b| b.get("context"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let env_file = body
            .and_then(|m| field_str(m, "env_file"))
            .map(str::to_string);

        let ports = body.map(|m| field_strings(m, "ports")).unwrap_or_default();
        let environment = body
            .map(|m| field_strings(m, "environment"))
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                let mut parts = entry.splitn(2, '=');
                EnvEntry::new(parts.next().unwrap_or(""), parts.next().unwrap_or(""))
            })
            .collect();
        let volumes = body
            .map(|m| field_strings(m, "volumes"))
            .unwrap_or_default()
            .into_iter()
            .map(|entry| {
                let mut parts = entry.splitn(2, ':');
                VolumeMapping::new(parts.next().unwrap_or(""), parts.next().unwrap_or(""))
            })
            .collect();

        defs.push(ServiceDefinition {
            service_name,
            build_context,
            image,
            env_file,
            ports,
            environment,
            volumes,
        });
    }

    Ok(defs)
}

fn string_sequence(items: impl Iterator<Item = String>) -> Value {
    Value::Sequence(items.map(Value::String).collect())
}

fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key)
}

fn field_str<'a>(map: &'a Mapping, key: &str) -> Option<&'a str> {
    field(map, key).and_then(Value::as_str)
}

/// 读一个可选的字符串列表字段
///
/// 标量按单元素列表处理，数值元素转为其文本形式
fn field_strings(map: &Mapping, key: &str) -> Vec<String> {
    match field(map, key) {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(value) => scalar_string(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_services() -> Vec<ServiceDefinition> {
        vec![
            ServiceDefinition {
                service_name: "api".to_string(),
                build_context: Some(".".to_string()),
                image: None,
                env_file: Some(".env".to_string()),
                ports: vec!["8080:80".to_string()],
                environment: vec![
                    EnvEntry::new("RUST_LOG", "info"),
                    EnvEntry::new("DATABASE_URL", "postgres://db:5432/shop"),
                ],
                volumes: vec![VolumeMapping::new("./data", "/var/lib/app")],
            },
            ServiceDefinition {
                service_name: "db".to_string(),
                build_context: None,
                image: Some("postgres:16".to_string()),
                env_file: None,
                ports: vec![],
                environment: vec![],
                volumes: vec![],
            },
        ]
    }

    #[test]
    fn test_serialize_synthesizes_default_image() {
        let doc = serialize(&sample_services(), "shop").unwrap();
        assert!(doc.contains("image: shop-api:latest"));
        assert!(doc.contains("image: postgres:16"));
    }

    #[test]
    fn test_serialize_omits_empty_sections() {
        let doc = serialize(&sample_services(), "shop").unwrap();
        // db 服务没有 ports/environment/volumes，不应出现空节
        let db_part = doc.split("\n  db:").nth(1).unwrap();
        assert!(!db_part.contains("ports"));
        assert!(!db_part.contains("environment"));
        assert!(!db_part.contains("volumes"));
        assert!(!db_part.contains("build"));
    }

    #[test]
    fn test_serialize_rejects_duplicate_names() {
        let mut services = sample_services();
        services[1].service_name = "api".to_string();
        let err = serialize(&services, "shop").unwrap_err();
        assert!(matches!(err, ControlError::Validation(_)));
    }

    #[test]
    fn test_round_trip_law() {
        let services = sample_services();
        let doc = serialize(&services, "shop").unwrap();
        let restored = deserialize(&doc).unwrap();

        assert_eq!(restored.len(), services.len());
        for (def, restored) in services.iter().zip(&restored) {
            assert_eq!(restored.service_name, def.service_name);
            assert_eq!(restored.resolved_image("shop"), def.resolved_image("shop"));
            assert_eq!(restored.ports, def.ports);
            assert_eq!(restored.environment, def.environment);
            assert_eq!(restored.volumes, def.volumes);
            assert_eq!(restored.build_context, def.build_context);
            assert_eq!(restored.env_file, def.env_file);
        }

        // 再序列化一轮应产出相同文档
        let doc2 = serialize(&restored, "shop").unwrap();
        assert_eq!(doc, doc2);
    }

    #[test]
    fn test_deserialize_preserves_document_order() {
        let doc = "services:\n  zeta:\n    image: z:1\n  alpha:\n    image: a:1\n";
        let defs = deserialize(doc).unwrap();
        assert_eq!(defs[0].service_name, "zeta");
        assert_eq!(defs[1].service_name, "alpha");
    }

    #[test]
    fn test_deserialize_splits_once() {
        let doc = "services:\n  api:\n    image: x:1\n    environment:\n      - \"URL=postgres://u:p@h/db\"\n    volumes:\n      - \"./a:/b:ro\"\n";
        let defs = deserialize(doc).unwrap();
        // 值里的 = 和 : 不再拆分
        assert_eq!(defs[0].environment[0].key, "URL");
        assert_eq!(defs[0].environment[0].value, "postgres://u:p@h/db");
        assert_eq!(defs[0].volumes[0].host_path, "./a");
        assert_eq!(defs[0].volumes[0].container_path, "/b:ro");
    }

    #[test]
    fn test_deserialize_missing_sections_yield_empty_lists() {
        let doc = "services:\n  api:\n    image: x:1\n";
        let defs = deserialize(doc).unwrap();
        assert!(defs[0].ports.is_empty());
        assert!(defs[0].environment.is_empty());
        assert!(defs[0].volumes.is_empty());
        assert!(defs[0].build_context.is_none());
    }

    #[test]
    fn test_deserialize_malformed_document() {
        assert!(deserialize("not: [valid\n").is_err());
        assert!(deserialize("version: '3'\n").is_err());
    }
}
