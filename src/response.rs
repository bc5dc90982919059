use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一API响应格式
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// 业务响应码
    pub code: i32,
    /// 响应消息（中文）
    pub msg: String,
    /// 响应数据
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: ResponseCode::SUCCESS,
            msg: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（仅消息）
    pub fn message_success<M: Into<String>>(msg: M) -> ApiResponse<()> {
        ApiResponse {
            code: ResponseCode::SUCCESS,
            msg: msg.into(),
            data: None,
        }
    }

    /// 创建错误响应
    pub fn error(code: i32, msg: String) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg,
            data: None,
        }
    }

    /// 创建错误响应（带数据）
    pub fn error_with_data(code: i32, msg: String, data: T) -> Self {
        Self {
            code,
            msg,
            data: Some(data),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        // 根据业务响应码确定HTTP状态码
        let status = match self.code {
            ResponseCode::SUCCESS => StatusCode::OK,
            ResponseCode::BAD_REQUEST => StatusCode::BAD_REQUEST,
            ResponseCode::UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            ResponseCode::MISMATCHED_CREDENTIALS => StatusCode::FORBIDDEN,
            ResponseCode::NOT_FOUND => StatusCode::NOT_FOUND,
            ResponseCode::DUPLICATE_RESOURCE => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// 业务响应码常量
pub struct ResponseCode;

impl ResponseCode {
    /// 成功响应码
    pub const SUCCESS: i32 = 200;

    /// 客户端错误 4xx
    pub const BAD_REQUEST: i32 = 400;
    pub const UNAUTHORIZED: i32 = 401;
    pub const MISMATCHED_CREDENTIALS: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    pub const DUPLICATE_RESOURCE: i32 = 409; // Conflict

    /// 服务器错误 5xx
    pub const INTERNAL_ERROR: i32 = 500;
    pub const DATABASE_ERROR: i32 = 501;
    pub const STORAGE_ERROR: i32 = 502;
    pub const CACHE_ERROR: i32 = 503;
}
