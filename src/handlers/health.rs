use super::AppState;
use crate::{error::AppResult, response::ApiResponse};
use axum::{extract::State, response::Json};
use serde_json::{Value, json};

/// 服务健康检查
pub async fn health_check() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// 数据库健康检查
pub async fn db_health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    component_health("database", "数据库", state.database.health_check().await)
}

/// 会话存储健康检查
pub async fn session_health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    component_health("session", "会话存储", state.admin.session_health().await)
}

/// 文件存储健康检查
pub async fn storage_health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    component_health("storage", "存储服务", state.storage.health_check().await)
}

fn component_health(key: &str, label: &str, result: AppResult<bool>) -> Json<ApiResponse<Value>> {
    match result {
        Ok(true) => {
            let mut details = serde_json::Map::new();
            details.insert(key.to_string(), json!("healthy"));
            details.insert("timestamp".to_string(), json!(chrono::Utc::now().to_rfc3339()));
            Json(ApiResponse::success(Value::Object(details)))
        }
        Ok(false) => Json(ApiResponse::error_with_data(
            503,
            format!("{}连接异常", label),
            json!({"status": "unhealthy"}),
        )),
        Err(e) => {
            tracing::error!("{}健康检查失败: {}", label, e);
            Json(ApiResponse::error_with_data(
                503,
                format!("{}健康检查失败: {}", label, e),
                json!({"status": "error"}),
            ))
        }
    }
}
