use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::LoadOsError;
use crate::response::{ApiResponse, ResponseCode};

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("缓存错误: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("密码哈希错误: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error(transparent)]
    LoadEnv(#[from] LoadOsError),

    #[error("加解密错误: {0}")]
    Cipher(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("用户名已存在")]
    UsernameAlreadyExists,

    #[error("用户名或密码错误")]
    MismatchedCredentials,

    #[error("未授权")]
    Unauthorized,

    #[error("无效的令牌: {0}")]
    InvalidToken(String),

    #[error("文件未找到: {path}")]
    FileNotFound { path: String },

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("资源不存在: {resource}")]
    NotFound { resource: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Database(_) => (ResponseCode::DATABASE_ERROR, "数据库错误".to_string()),
            AppError::Cache(_) => (ResponseCode::CACHE_ERROR, "缓存服务错误".to_string()),
            AppError::Serialization(_) => {
                (ResponseCode::INTERNAL_ERROR, "数据序列化错误".to_string())
            }
            AppError::Io(_) => (ResponseCode::INTERNAL_ERROR, "文件IO错误".to_string()),
            AppError::Hash(_) => (ResponseCode::INTERNAL_ERROR, "密码处理错误".to_string()),
            AppError::Config(_) | AppError::LoadEnv(_) => {
                (ResponseCode::INTERNAL_ERROR, "配置错误".to_string())
            }
            AppError::Cipher(_) => (ResponseCode::INTERNAL_ERROR, "加解密错误".to_string()),
            AppError::Storage(_) => (ResponseCode::STORAGE_ERROR, self.to_string()),
            AppError::UsernameAlreadyExists => {
                (ResponseCode::DUPLICATE_RESOURCE, self.to_string())
            }
            AppError::MismatchedCredentials => {
                (ResponseCode::MISMATCHED_CREDENTIALS, self.to_string())
            }
            AppError::Unauthorized | AppError::InvalidToken(_) => {
                (ResponseCode::UNAUTHORIZED, "未授权".to_string())
            }
            AppError::FileNotFound { path } => {
                (ResponseCode::NOT_FOUND, format!("文件未找到: {}", path))
            }
            AppError::Internal(_) => (ResponseCode::INTERNAL_ERROR, "服务器内部错误".to_string()),
            AppError::BadRequest(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { resource } => {
                (ResponseCode::NOT_FOUND, format!("资源不存在: {}", resource))
            }
        };

        // 业务拒绝只记警告，后端故障记错误
        if code < ResponseCode::INTERNAL_ERROR {
            tracing::warn!("请求被拒绝: {}", self);
        } else {
            tracing::error!("应用错误: {}", self);
        }

        ApiResponse::<()>::error(code, message).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn file_not_found<T: Into<String>>(path: T) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::Internal(anyhow::anyhow!(msg.into()))
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn cipher<T: Into<String>>(msg: T) -> Self {
        Self::Cipher(msg.into())
    }

    pub fn invalid_token<T: Into<String>>(msg: T) -> Self {
        Self::InvalidToken(msg.into())
    }
}
