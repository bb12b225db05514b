//! 远端主机资源快照与服务状态探测

use tracing::debug;

use crate::domain::server::{ResourceSnapshot, ServiceStatus};
use crate::error::ControlError;
use crate::infra::command::sh_quote;
use crate::services::executor::{CommandExecutor, SuccessPolicy};
use crate::services::parsers;
use crate::state::connection_registry::Connection;

const RAM_COMMAND: &str = "free -m";
const CPU_COMMAND: &str = "top -bn1 | grep 'Cpu(s)'";
const DISK_COMMAND: &str = "df -h --total | grep total";

/// 采集资源快照
///
/// 三条子命令并发下发，各自独立临时会话；
/// 结果按固定类别位置组装，与完成顺序无关
pub async fn server_status(conn: &Connection) -> Result<ResourceSnapshot, ControlError> {
    let (ram, cpu, disk) = tokio::join!(
        CommandExecutor::ephemeral_checked(conn, RAM_COMMAND, SuccessPolicy::ExitOnly),
        CommandExecutor::ephemeral_checked(conn, CPU_COMMAND, SuccessPolicy::ExitOnly),
        CommandExecutor::ephemeral_checked(conn, DISK_COMMAND, SuccessPolicy::ExitOnly),
    );

    let (ram_used, ram_available) = parsers::parse_memory(&ram?.stdout)?;
    let (cpu_used, cpu_available) = parsers::parse_cpu(&cpu?.stdout)?;
    let (disk_used, disk_available) = parsers::parse_disk(&disk?.stdout)?;

    Ok(ResourceSnapshot {
        categories: vec!["ram".to_string(), "cpu".to_string(), "disk".to_string()],
        used: vec![ram_used as f64, cpu_used, disk_used],
        available: vec![ram_available as f64, cpu_available, disk_available],
        units: vec!["MB".to_string(), "%".to_string(), "GB".to_string()],
    })
}

/// 探测一个系统服务的安装与运行状态
///
/// which 判安装，ss 找端口，systemctl 判活跃，
/// docker 的内存占用走 docker stats，其余按数据目录大小估算
pub async fn service_status(
    conn: &Connection,
    service: &str,
) -> Result<ServiceStatus, ControlError> {
    let service = service.trim();
    if service.is_empty() {
        return Err(ControlError::Validation(
            "service name must not be empty".to_string(),
        ));
    }

    let which = CommandExecutor::ephemeral(
        conn,
        &format!("which {}", sh_quote(service)),
        SuccessPolicy::ExitOnly,
    )
    .await?;
    let is_installed = which.success && !which.stdout.is_empty();

    if !is_installed {
        debug!(connection_id = %conn.id, service = %service, "Service not installed");
        return Ok(ServiceStatus {
            service: service.to_string(),
            is_installed: false,
            is_active: false,
            port: None,
            memory_usage: None,
        });
    }

    let netstat = CommandExecutor::ephemeral(conn, "ss -tuln", SuccessPolicy::ExitOnly).await?;
    let port = netstat
        .stdout
        .lines()
        .find(|line| line.contains(service))
        .and_then(|line| line.split_whitespace().nth(4))
        .map(str::to_string);

    // psql 的 systemd 单元名是 postgresql
    let unit = if service == "psql" { "postgresql" } else { service };
    let active = CommandExecutor::ephemeral(
        conn,
        &format!("systemctl is-active {}", sh_quote(unit)),
        SuccessPolicy::ExitOnly,
    )
    .await?;
    let is_active = active.stdout.trim() == "active";

    let memory_usage = if service == "docker" {
        let stats = CommandExecutor::ephemeral(
            conn,
            "docker stats --no-stream --format '{{.MemUsage}}'",
            SuccessPolicy::ExitOnly,
        )
        .await?;
        stats
            .success
            .then(|| stats.stdout.trim().to_string())
            .filter(|s| !s.is_empty())
    } else {
        let du = CommandExecutor::ephemeral(
            conn,
            &format!("du -sh {}", sh_quote(&format!("/var/lib/{}", service))),
            SuccessPolicy::ExitOnly,
        )
        .await?;
        du.success
            .then(|| du.stdout.split_whitespace().next().map(str::to_string))
            .flatten()
    };

    Ok(ServiceStatus {
        service: service.to_string(),
        is_installed,
        is_active,
        port,
        memory_usage,
    })
}
