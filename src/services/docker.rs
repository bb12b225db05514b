//! 容器编排用例
//!
//! 列表、生命周期驱动、compose up/down/rebuild、镜像构建。
//! 状态变更后一律重新查询远端，返回权威状态而不是
//! 触发命令自身的退出码

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::domain::compose::ServiceDefinition;
use crate::domain::container::{
    ContainerAction, ContainerRecord, ContainerState, ImageActionRequest, ImageRecord,
};
use crate::domain::repo::{BuildBundle, BuildRequest};
use crate::error::ControlError;
use crate::infra::command::{sh_quote, ShellScript};
use crate::services::compose::{self, COMPOSE_FILE_NAME};
use crate::services::executor::{CommandExecutor, SuccessPolicy};
use crate::services::parsers;
use crate::services::repo_sync;
use crate::state::connection_registry::Connection;

/// 列出全部容器
///
/// 读多写少的轻量查询，走持久通道
pub async fn list_containers(conn: &Connection) -> Result<Vec<ContainerRecord>, ControlError> {
    let command = format!(
        "docker ps -a --format {}",
        sh_quote(parsers::CONTAINER_PS_FORMAT)
    );
    let result = CommandExecutor::persistent_checked(conn, &command, SuccessPolicy::ExitOnly).await?;
    parsers::parse_containers(&result.stdout)
}

/// 列出镜像并交叉推导使用状态
///
/// 两条子命令并发执行，各自持有独立临时会话，互不阻塞
pub async fn list_images(conn: &Connection) -> Result<Vec<ImageRecord>, ControlError> {
    let images_command = format!(
        "docker images --format {}",
        sh_quote(parsers::IMAGE_JSON_FORMAT)
    );
    let running_command = format!("docker ps --format {}", sh_quote(parsers::RUNNING_PS_FORMAT));

    let (images_result, running_result) = tokio::join!(
        CommandExecutor::ephemeral_checked(conn, &images_command, SuccessPolicy::ExitOnly),
        CommandExecutor::ephemeral_checked(conn, &running_command, SuccessPolicy::ExitOnly),
    );

    let images = parsers::parse_images(&images_result?.stdout)?;
    let running = parsers::parse_running_refs(&running_result?.stdout)?;
    Ok(parsers::apply_usage_status(images, &running))
}

/// 按 id 或名称查询单个容器的权威状态
pub async fn container_detail(
    conn: &Connection,
    container_ref: &str,
) -> Result<ContainerRecord, ControlError> {
    let containers = list_containers(conn).await?;
    containers
        .into_iter()
        .find(|c| {
            c.id.starts_with(container_ref)
                || container_ref.starts_with(&c.id)
                || c.names.iter().any(|n| n == container_ref)
        })
        .ok_or_else(|| ControlError::NotFound(format!("Container '{}'", container_ref)))
}

/// 生命周期动作的结果
///
/// remove 之后容器不可再查询，只返回完成标记
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ContainerActionOutcome {
    Record(ContainerRecord),
    Removed { container: String, removed: bool },
}

/// 驱动容器生命周期
///
/// 先查当前状态校验转换合法性，再下发命令；
/// 除 remove 外都以一次状态重查收尾
pub async fn container_action(
    conn: &Connection,
    container_ref: &str,
    action: ContainerAction,
) -> Result<ContainerActionOutcome, ControlError> {
    let current = container_detail(conn, container_ref).await?;
    if !action.allowed_from(current.state) {
        return Err(ControlError::Validation(format!(
            "cannot {} container '{}' in state '{:?}'",
            action.name(),
            container_ref,
            current.state
        )));
    }

    // 用解析出的完整 id 下发，避免名称在动作之间漂移
    let target = sh_quote(&current.id);
    let command = match action {
        ContainerAction::Start => format!("docker start {}", target),
        ContainerAction::Stop => format!("docker stop {}", target),
        ContainerAction::Pause => format!("docker pause {}", target),
        ContainerAction::Resume => format!("docker unpause {}", target),
        ContainerAction::Restart => {
            // 暂停中的容器需要先恢复，restart 本身即 stop-then-start
            if current.state == ContainerState::Paused {
                ShellScript::new()
                    .step(format!("docker unpause {}", target))
                    .step(format!("docker restart {}", target))
                    .render()
            } else {
                format!("docker restart {}", target)
            }
        }
        ContainerAction::Remove => format!("docker rm {}", target),
    };

    // 生命周期命令可能耗时较长（stop 等待进程退出），走临时会话，
    // 严格策略：状态变更命令的 stderr 非空即失败
    CommandExecutor::ephemeral_checked(conn, &command, SuccessPolicy::Strict).await?;

    info!(
        connection_id = %conn.id,
        container = %current.id,
        action = action.name(),
        "Container action applied"
    );

    if action == ContainerAction::Remove {
        return Ok(ContainerActionOutcome::Removed {
            container: current.id,
            removed: true,
        });
    }

    let fresh = container_detail(conn, &current.id).await?;
    Ok(ContainerActionOutcome::Record(fresh))
}

/// 探测远端可用的 compose 入口
///
/// 优先 docker-compose，缺席则回退到 docker compose 插件
pub async fn compose_binary(conn: &Connection) -> Result<&'static str, ControlError> {
    let probe =
        CommandExecutor::ephemeral(conn, "command -v docker-compose", SuccessPolicy::ExitOnly)
            .await?;
    if probe.success && !probe.stdout.is_empty() {
        Ok("docker-compose")
    } else {
        Ok("docker compose")
    }
}

/// compose 服务级操作
#[derive(Debug, Clone, Copy)]
enum ComposeOp {
    Up,
    Down,
    Rebuild,
}

impl ComposeOp {
    fn arguments(&self) -> &'static str {
        match self {
            Self::Up => "up -d",
            Self::Down => "stop",
            Self::Rebuild => "up -d --build --force-recreate",
        }
    }
}

async fn compose_service_op(
    conn: &Connection,
    request: &ImageActionRequest,
    op: ComposeOp,
) -> Result<ImageRecord, ControlError> {
    if request.server_path.trim().is_empty() || request.service_name.trim().is_empty() {
        return Err(ControlError::Validation(
            "server_path and service_name are required".to_string(),
        ));
    }

    let compose = compose_binary(conn).await?;
    let script = ShellScript::fail_fast()
        .step(format!("cd {}", sh_quote(&request.server_path)))
        .step(format!(
            "{} -f {} {} {}",
            compose,
            sh_quote(COMPOSE_FILE_NAME),
            op.arguments(),
            sh_quote(&request.service_name),
        ))
        .render();

    CommandExecutor::ephemeral_checked(conn, &script, SuccessPolicy::ExitOnly).await?;

    // 以镜像列表的新鲜快照收尾，不信任触发命令自身的状态
    refresh_image(conn, request).await
}

/// 启动服务并返回镜像的权威状态
pub async fn service_up(
    conn: &Connection,
    request: &ImageActionRequest,
) -> Result<ImageRecord, ControlError> {
    compose_service_op(conn, request, ComposeOp::Up).await
}

/// 停止服务并返回镜像的权威状态
pub async fn service_down(
    conn: &Connection,
    request: &ImageActionRequest,
) -> Result<ImageRecord, ControlError> {
    compose_service_op(conn, request, ComposeOp::Down).await
}

/// 重建并重启服务
pub async fn service_rebuild(
    conn: &Connection,
    request: &ImageActionRequest,
) -> Result<ImageRecord, ControlError> {
    compose_service_op(conn, request, ComposeOp::Rebuild).await
}

async fn refresh_image(
    conn: &Connection,
    request: &ImageActionRequest,
) -> Result<ImageRecord, ControlError> {
    let images = list_images(conn).await?;
    images
        .into_iter()
        .find(|image| {
            let full_name = format!("{}:{}", image.repository, image.tag);
            let id_hit = request
                .image_id
                .as_deref()
                .map(|id| !id.is_empty() && (image.id.starts_with(id) || id.starts_with(&image.id)))
                .unwrap_or(false);
            id_hit || image.repository == request.image_name || full_name == request.image_name
        })
        .ok_or_else(|| ControlError::NotFound(format!("Image '{}'", request.image_name)))
}

/// 构建镜像
///
/// clone-or-update → 可选写入编排文档 → 可选写入 .env → 远端构建，
/// 然后回读落盘文档，让调用方看到远端磁盘上真实存在的内容
pub async fn build_image(
    conn: &Connection,
    request: &BuildRequest,
    base_dir: &str,
    git_timeout: Duration,
) -> Result<BuildBundle, ControlError> {
    let (server_path, _sync) =
        repo_sync::clone_or_update(conn, &request.repo, base_dir, git_timeout).await?;
    let base_name = repo_sync::sanitize_repo_name(request.repo.name.trim());

    let mut script = ShellScript::fail_fast().step(format!("cd {}", sh_quote(&server_path)));

    if !request.services.is_empty() {
        let document = compose::serialize(&request.services, &base_name)?;
        script = script.step(format!(
            "printf %s {} > {}",
            sh_quote(&document),
            COMPOSE_FILE_NAME
        ));
    }

    let env_content = request
        .repo_env
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(env) = &env_content {
        script = script.step(format!("printf %s {} > .env", sh_quote(env)));
    }

    let compose_bin = compose_binary(conn).await?;
    script = script.step(format!("{} build", compose_bin));

    let result =
        CommandExecutor::ephemeral_checked(conn, &script.render(), SuccessPolicy::ExitOnly).await?;

    // 回读：构建后的服务列表来自远端文档本身
    let services = read_back_services(conn, &server_path).await?;

    info!(
        connection_id = %conn.id,
        server_path = %server_path,
        services = services.len(),
        "Image build completed"
    );

    Ok(BuildBundle {
        server_path,
        pull_status: true,
        result,
        services,
        env_content,
    })
}

async fn read_back_services(
    conn: &Connection,
    server_path: &str,
) -> Result<Vec<ServiceDefinition>, ControlError> {
    let path = format!("{}/{}", server_path, COMPOSE_FILE_NAME);
    let cat = format!("cat {}", sh_quote(&path));
    let result = CommandExecutor::ephemeral(conn, &cat, SuccessPolicy::ExitOnly).await?;
    if !result.success {
        // 仓库本身没有编排文档，也没有生成过
        return Ok(Vec::new());
    }
    compose::deserialize(&result.stdout)
}
