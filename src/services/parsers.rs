//! CLI 输出解析
//!
//! 从原始文本到类型化记录的纯函数，容忍末尾空行。
//! 解析策略：遇到畸形行立即报 Parse 错误，
//! 静默截断的列表比显式失败更糟

use serde::Deserialize;

use crate::domain::container::{
    ContainerRecord, ContainerState, ImageRecord, ImageUsage,
};
use crate::error::ControlError;

/// `docker ps -a` 的管道分隔格式，与 [`parse_containers`] 一一对应
pub const CONTAINER_PS_FORMAT: &str =
    "{{.ID}}|{{.Names}}|{{.Image}}|{{.Ports}}|{{.State}}|{{.Status}}|{{.RunningFor}}|{{.CreatedAt}}";

/// 运行中容器的交叉引用格式
pub const RUNNING_PS_FORMAT: &str = "{{.Image}}|{{.ID}}|{{.Names}}";

/// `docker images` 的自描述 JSON 行格式
pub const IMAGE_JSON_FORMAT: &str = "{{json .}}";

/// 解析容器列表
///
/// 空输入产出空列表，不是错误
pub fn parse_containers(raw: &str) -> Result<Vec<ContainerRecord>, ControlError> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_container_line)
        .collect()
}

fn parse_container_line(line: &str) -> Result<ContainerRecord, ControlError> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 8 {
        return Err(ControlError::parse(
            "container listing",
            format!("expected 8 fields, got {}: '{}'", parts.len(), line),
        ));
    }
    Ok(ContainerRecord {
        id: parts[0].to_string(),
        names: split_list(parts[1]),
        image: parts[2].to_string(),
        ports: split_list(parts[3]),
        state: ContainerState::parse(parts[4])?,
        status: parts[5].to_string(),
        age: parts[6].to_string(),
        created: parts[7].to_string(),
    })
}

/// 逗号分隔字段拆为列表，空字段产出空列表
fn split_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `docker images --format "{{json .}}"` 的单行记录
#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Repository")]
    repository: String,
    #[serde(rename = "Tag")]
    tag: String,
    #[serde(rename = "Size", default)]
    size: String,
    #[serde(rename = "CreatedSince", default)]
    created_since: String,
}

/// 解析镜像列表，使用状态初始为 Unused，
/// 由 [`apply_usage_status`] 交叉推导
pub fn parse_images(raw: &str) -> Result<Vec<ImageRecord>, ControlError> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let raw_image: RawImage = serde_json::from_str(line).map_err(|e| {
                ControlError::parse("image listing", format!("{}: '{}'", e, line))
            })?;
            Ok(ImageRecord {
                id: raw_image.id,
                repository: raw_image.repository,
                tag: raw_image.tag,
                size: raw_image.size,
                created: raw_image.created_since,
                usage: ImageUsage::Unused,
                container_id: None,
                container_name: None,
            })
        })
        .collect()
}

/// 运行中容器对镜像的引用
#[derive(Debug, Clone)]
pub struct RunningContainerRef {
    pub image: String,
    pub id: String,
    pub name: String,
}

/// 解析运行中容器的镜像引用列表
pub fn parse_running_refs(raw: &str) -> Result<Vec<RunningContainerRef>, ControlError> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() != 3 {
                return Err(ControlError::parse(
                    "running container listing",
                    format!("expected 3 fields, got {}: '{}'", parts.len(), line),
                ));
            }
            Ok(RunningContainerRef {
                image: parts[0].to_string(),
                id: parts[1].to_string(),
                name: parts[2].to_string(),
            })
        })
        .collect()
}

/// 按名称或 id 将运行中容器匹配到镜像上
///
/// 命中的镜像标记 In use 并带上容器 id/名称，未命中保持 Unused
pub fn apply_usage_status(
    images: Vec<ImageRecord>,
    running: &[RunningContainerRef],
) -> Vec<ImageRecord> {
    images
        .into_iter()
        .map(|mut image| {
            if let Some(hit) = running.iter().find(|r| image_matches(&image, r)) {
                image.usage = ImageUsage::InUse;
                image.container_id = Some(hit.id.clone());
                image.container_name = Some(hit.name.clone());
            }
            image
        })
        .collect()
}

fn image_matches(image: &ImageRecord, running: &RunningContainerRef) -> bool {
    // docker ps 的 Image 列可能是 repo、repo:tag 或镜像 id 前缀
    running.image == image.repository
        || running.image == format!("{}:{}", image.repository, image.tag)
        || (!image.id.is_empty()
            && (running.image.starts_with(&image.id) || image.id.starts_with(&running.image)))
}

/// 解析 `free -m` 输出
///
/// 取首个以 `Mem:` 开头的行，used/available 是第 2/3 个数值字段
pub fn parse_memory(raw: &str) -> Result<(u64, u64), ControlError> {
    let line = raw
        .lines()
        .find(|line| line.trim_start().starts_with("Mem:"))
        .ok_or_else(|| ControlError::parse("memory output", "no 'Mem:' line found"))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ControlError::parse(
            "memory output",
            format!("expected at least 4 fields in '{}'", line),
        ));
    }
    let used = fields[2].parse::<u64>().map_err(|e| {
        ControlError::parse("memory output", format!("used field '{}': {}", fields[2], e))
    })?;
    let available = fields[3].parse::<u64>().map_err(|e| {
        ControlError::parse(
            "memory output",
            format!("available field '{}': {}", fields[3], e),
        )
    })?;
    Ok((used, available))
}

/// 解析 CPU 汇总行的用户态百分比，available = 100 - used
///
/// 兼容 `%Cpu(s):  5.3 us, ...` 与旧版 `Cpu(s): 12.5%us, ...` 两种格式
pub fn parse_cpu(raw: &str) -> Result<(f64, f64), ControlError> {
    for segment in raw.split(',') {
        if let Some(used) = user_time_value(segment) {
            return Ok((used, 100.0 - used));
        }
    }
    Err(ControlError::parse(
        "cpu output",
        format!("no user-time field in '{}'", raw.trim()),
    ))
}

fn user_time_value(segment: &str) -> Option<f64> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if *token == "us" && i > 0 {
            return tokens[i - 1].trim_end_matches('%').parse().ok();
        }
        if let Some(number) = token.strip_suffix("%us").or_else(|| token.strip_suffix("us")) {
            if let Ok(value) = number.parse() {
                return Some(value);
            }
        }
    }
    None
}

/// 解析 `df -h --total` 的 total 行
///
/// used/available 是第 2/3 个字段，剥去单位后缀按浮点解析
pub fn parse_disk(raw: &str) -> Result<(f64, f64), ControlError> {
    let line = raw
        .lines()
        .find(|line| line.trim_start().starts_with("total"))
        .ok_or_else(|| ControlError::parse("disk output", "no 'total' line found"))?;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ControlError::parse(
            "disk output",
            format!("expected at least 4 fields in '{}'", line),
        ));
    }
    Ok((size_value(fields[2])?, size_value(fields[3])?))
}

fn size_value(field: &str) -> Result<f64, ControlError> {
    field
        .trim_end_matches(|c: char| c.is_alphabetic())
        .parse::<f64>()
        .map_err(|e| ControlError::parse("disk output", format!("size field '{}': {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_containers() {
        let raw = "abc123|web|nginx:1.25|0.0.0.0:80->80/tcp|running|Up 2 hours|2 hours|2024-03-01 10:00:00 +0000 UTC\n\
                   def456|worker,worker-old|shop-api:latest||exited|Exited (0) 3 days ago|3 days|2024-02-27 09:00:00 +0000 UTC\n";
        let containers = parse_containers(raw).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].id, "abc123");
        assert_eq!(containers[0].names, vec!["web"]);
        assert_eq!(containers[0].state, ContainerState::Running);
        assert_eq!(containers[0].ports, vec!["0.0.0.0:80->80/tcp"]);
        assert_eq!(containers[1].names, vec!["worker", "worker-old"]);
        assert_eq!(containers[1].state, ContainerState::Stopped);
        assert!(containers[1].ports.is_empty());
    }

    #[test]
    fn test_parse_containers_empty_input() {
        assert!(parse_containers("").unwrap().is_empty());
        assert!(parse_containers("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_containers_malformed_line_aborts() {
        let raw = "abc|web|nginx|running\n";
        let err = parse_containers(raw).unwrap_err();
        assert!(matches!(err, ControlError::Parse { .. }));
    }

    #[test]
    fn test_parse_images_json_lines() {
        let raw = concat!(
            r#"{"ID":"sha1","Repository":"shop-api","Tag":"latest","Size":"120MB","CreatedSince":"2 days ago"}"#,
            "\n",
            r#"{"ID":"sha2","Repository":"postgres","Tag":"16","Size":"431MB","CreatedSince":"3 weeks ago"}"#,
            "\n",
        );
        let images = parse_images(raw).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].repository, "shop-api");
        assert_eq!(images[0].usage, ImageUsage::Unused);
        assert_eq!(images[1].tag, "16");
    }

    #[test]
    fn test_parse_images_malformed_json_aborts() {
        let err = parse_images("not json at all\n").unwrap_err();
        assert!(matches!(err, ControlError::Parse { .. }));
    }

    #[test]
    fn test_usage_cross_reference() {
        let images = parse_images(concat!(
            r#"{"ID":"sha1","Repository":"shop-api","Tag":"latest","Size":"1MB","CreatedSince":"now"}"#,
            "\n",
            r#"{"ID":"sha2","Repository":"postgres","Tag":"16","Size":"1MB","CreatedSince":"now"}"#,
            "\n",
        ))
        .unwrap();
        let running = parse_running_refs("shop-api:latest|c1|web\n").unwrap();

        let images = apply_usage_status(images, &running);
        assert_eq!(images[0].usage, ImageUsage::InUse);
        assert_eq!(images[0].container_id.as_deref(), Some("c1"));
        assert_eq!(images[0].container_name.as_deref(), Some("web"));
        assert_eq!(images[1].usage, ImageUsage::Unused);
        assert!(images[1].container_id.is_none());
    }

    #[test]
    fn test_usage_matches_by_image_id() {
        let images = parse_images(
            r#"{"ID":"f2a1b3c4","Repository":"<none>","Tag":"<none>","Size":"1MB","CreatedSince":"now"}"#,
        )
        .unwrap();
        let running = parse_running_refs("f2a1b3c4|c9|ghost\n").unwrap();
        let images = apply_usage_status(images, &running);
        assert_eq!(images[0].usage, ImageUsage::InUse);
    }

    #[test]
    fn test_parse_memory() {
        let raw = "              total        used        free      shared  buff/cache   available\n\
                   Mem: 7975 4432 3543 120 900 3200\n\
                   Swap: 2048 0 2048\n";
        let (used, available) = parse_memory(raw).unwrap();
        assert_eq!(used, 4432);
        assert_eq!(available, 3543);
    }

    #[test]
    fn test_parse_memory_missing_line() {
        let err = parse_memory("Swap: 1 2 3\n").unwrap_err();
        assert!(matches!(err, ControlError::Parse { .. }));
    }

    #[test]
    fn test_parse_cpu_modern_format() {
        let raw = "%Cpu(s):  5.3 us,  2.1 sy,  0.0 ni, 92.1 id,  0.3 wa,  0.0 hi,  0.2 si,  0.0 st\n";
        let (used, available) = parse_cpu(raw).unwrap();
        assert!((used - 5.3).abs() < f64::EPSILON);
        assert!((available - 94.7).abs() < 1e-9);
    }

    #[test]
    fn test_parse_cpu_legacy_format() {
        let raw = "Cpu(s): 12.5%us,  3.0%sy,  0.0%ni, 84.0%id\n";
        let (used, _) = parse_cpu(raw).unwrap();
        assert!((used - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_cpu_no_field() {
        assert!(parse_cpu("nothing useful here\n").is_err());
    }

    #[test]
    fn test_parse_disk() {
        let raw = "Filesystem      Size  Used Avail Use% Mounted on\n\
                   /dev/sda1        98G   52G   42G  56% /\n\
                   total           196G   84G  103G  45% -\n";
        let (used, available) = parse_disk(raw).unwrap();
        assert!((used - 84.0).abs() < f64::EPSILON);
        assert!((available - 103.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_disk_fractional_sizes() {
        let raw = "total 1.5T 1.1T 0.4T 74% -\n";
        let (used, available) = parse_disk(raw).unwrap();
        assert!((used - 1.1).abs() < f64::EPSILON);
        assert!((available - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trailing_blank_lines_tolerated() {
        assert!(parse_containers("\n").unwrap().is_empty());
        assert!(parse_images("\n\n").unwrap().is_empty());
        assert!(parse_running_refs("").unwrap().is_empty());
    }
}
