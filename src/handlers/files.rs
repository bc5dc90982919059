use super::AppState;
use crate::error::{AppError, AppResult};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};

/// 读取存储中的文件，内容类型按文件头识别
#[utoipa::path(
    get,
    path = "/files/{name}",
    tag = "文件上传",
    params(("name" = String, Path, description = "存储文件名")),
    responses(
        (status = 200, description = "文件内容"),
        (status = 404, description = "文件不存在")
    )
)]
pub async fn serve_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    let data = state.storage.get_file(&name).await?;
    let content_type = infer::get(&data)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("构建响应失败: {}", e)))
}
