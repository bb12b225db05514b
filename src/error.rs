//! 统一错误处理
//!
//! `ControlError` 是核心层的错误分类，`ApiError` 实现 `IntoResponse`，
//! 替代重复的 `(StatusCode, Json<ErrorResponse>)` 模式

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 核心层错误分类
///
/// 所有远程操作的失败都归入这五类，携带原始诊断文本，
/// 任何一层都不允许吞掉错误
#[derive(Debug, Error)]
pub enum ControlError {
    /// 建立连接失败（认证或网络错误）
    #[error("connection failed: {0}")]
    Connection(String),

    /// 连接标识不存在或已失效
    #[error("{0} not found")]
    NotFound(String),

    /// 命令执行失败（非零退出码，或严格策略下 stderr 非空）
    #[error("command failed with exit code {exit_code}: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// 结构化输出解析失败
    #[error("failed to parse {context}: {detail}")]
    Parse {
        context: &'static str,
        detail: String,
    },

    /// 请求参数无效
    #[error("{0}")]
    Validation(String),
}

impl ControlError {
    pub fn parse(context: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse {
            context,
            detail: detail.into(),
        }
    }
}

/// API 错误响应结构
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// 统一 API 错误类型
#[derive(Debug)]
pub enum ApiError {
    /// 401 - 未授权（API Key 无效或缺失）
    Unauthorized,
    /// 404 - 资源未找到
    NotFound(String),
    /// 400 - 请求无效
    BadRequest(String),
    /// 500 - 内部错误
    Internal(String),
}

impl ApiError {
    /// 创建未授权错误
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    /// 创建未找到错误
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// 创建请求无效错误
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Connection(msg) => ApiError::BadRequest(msg),
            ControlError::NotFound(resource) => ApiError::NotFound(resource),
            ControlError::CommandFailed { .. } => ApiError::BadRequest(err.to_string()),
            ControlError::Parse { .. } => ApiError::Internal(err.to_string()),
            ControlError::Validation(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or missing API key".to_string(),
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} not found", resource),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorResponse::new(error_type, message);
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(r) => write!(f, "Not found: {}", r),
            ApiError::BadRequest(m) => write!(f, "Bad request: {}", m),
            ApiError::Internal(m) => write!(f, "Internal error: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

/// 便捷类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_new() {
        let resp = ErrorResponse::new("test_error", "Test message");
        assert_eq!(resp.error, "test_error");
        assert_eq!(resp.message, "Test message");
        assert!(resp.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let resp = ErrorResponse::new("test_error", "Test message").with_details("Extra info");
        assert_eq!(resp.details, Some("Extra info".to_string()));
    }

    #[test]
    fn test_control_error_maps_to_api_error() {
        let err: ApiError = ControlError::NotFound("Connection 'a_b_c'".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = ControlError::CommandFailed {
            exit_code: 1,
            stderr: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = ControlError::parse("memory output", "no Mem: line").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_command_failed_display_carries_diagnostics() {
        let err = ControlError::CommandFailed {
            exit_code: 127,
            stderr: "sh: docker: not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("127"));
        assert!(text.contains("docker: not found"));
    }
}
