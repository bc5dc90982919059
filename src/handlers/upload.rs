use super::{AppState, auth::AuthAdmin};
use crate::{
    error::{AppError, AppResult},
    models::{Kind, List, MultiFile, OrderBy, Pagination, SingleFile, UserKind},
    response::ApiResponse,
};
use axum::{
    Extension,
    extract::{Multipart, Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 上传的文件
struct UploadedFile {
    name: String,
    data: Vec<u8>,
}

/// 读取表单中字段名为 `post_key` 的全部文件
async fn read_files(multipart: &mut Multipart, post_key: &str) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(post_key) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?.to_vec();
        files.push(UploadedFile { name, data });
    }

    if files.is_empty() {
        return Err(AppError::bad_request(format!("缺少文件字段: {}", post_key)));
    }
    Ok(files)
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    let message = e.body_text();
    if message.contains("body longer than") || message.contains("body is too large") {
        AppError::bad_request("上传文件过大")
    } else {
        AppError::bad_request(format!("文件上传失败: {}", message))
    }
}

/// 分类必须为正数，0 在查询条件中表示不限制分类
fn valid_kind(kind: Kind) -> AppResult<Kind> {
    if kind <= 0 {
        return Err(AppError::bad_request(format!("无效的文件分类: {}", kind)));
    }
    Ok(kind)
}

/// 剩余数量
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

/// 删除多文件请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteFilesRequest {
    pub ids: Vec<i64>,
}

/// 上传单一文件，替换已有文件
#[utoipa::path(
    post,
    path = "/api/files/single/{kind}",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    responses(
        (status = 200, description = "上传成功", body = SingleFile),
        (status = 400, description = "缺少文件")
    )
)]
pub async fn create_single(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<SingleFile>>> {
    let kind = valid_kind(kind)?;
    let mut files = read_files(&mut multipart, &state.config.upload.post_key).await?;
    let upload = files.swap_remove(0);

    let file = state
        .single_files
        .create(auth.admin_id, kind, &upload.name, &upload.data)
        .await?;

    Ok(Json(ApiResponse::success(file)))
}

/// 查询单一文件
#[utoipa::path(
    get,
    path = "/api/files/single/{kind}",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    responses(
        (status = 200, description = "查询成功", body = SingleFile),
        (status = 404, description = "文件不存在")
    )
)]
pub async fn get_single(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
) -> AppResult<Json<ApiResponse<SingleFile>>> {
    let kind = valid_kind(kind)?;
    let file = state
        .single_files
        .first(auth.admin_id, kind)
        .await?
        .ok_or_else(|| AppError::not_found(format!("分类 {} 的文件", kind)))?;

    Ok(Json(ApiResponse::success(file)))
}

/// 删除单一文件
#[utoipa::path(
    delete,
    path = "/api/files/single/{kind}",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    responses(
        (status = 200, description = "删除成功"),
        (status = 404, description = "文件不存在")
    )
)]
pub async fn delete_single(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
) -> AppResult<Json<ApiResponse<()>>> {
    let kind = valid_kind(kind)?;
    if !state.single_files.delete(auth.admin_id, kind).await? {
        return Err(AppError::not_found(format!("分类 {} 的文件", kind)));
    }

    Ok(Json(ApiResponse::<()>::message_success("删除成功")))
}

/// 上传多个文件
#[utoipa::path(
    post,
    path = "/api/files/multi/{kind}",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    responses(
        (status = 200, description = "上传成功", body = Vec<MultiFile>),
        (status = 400, description = "缺少文件")
    )
)]
pub async fn create_multi(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Vec<MultiFile>>>> {
    let kind = valid_kind(kind)?;
    let uploads = read_files(&mut multipart, &state.config.upload.post_key).await?;

    let mut files = Vec::with_capacity(uploads.len());
    for upload in uploads {
        files.push(
            state
                .multi_files
                .create(auth.admin_id, kind, &upload.name, &upload.data)
                .await?,
        );
    }

    Ok(Json(ApiResponse::success(files)))
}

/// 分页查询多文件
#[utoipa::path(
    get,
    path = "/api/files/multi/{kind}",
    tag = "文件上传",
    params(
        ("kind" = i64, Path, description = "文件分类，正整数"),
        ("limit" = Option<i64>, Query, description = "每页数量，1-500，默认10"),
        ("offset" = Option<i64>, Query, description = "偏移量"),
        ("order_by" = Option<String>, Query, description = "排序字段：id、user_id、kind、file"),
        ("descending" = Option<bool>, Query, description = "逆序")
    ),
    responses((status = 200, description = "查询成功", body = Vec<MultiFile>))
)]
pub async fn list_multi(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
    Query(pagination): Query<Pagination>,
    Query(order_by): Query<OrderBy>,
) -> AppResult<Json<ApiResponse<Vec<MultiFile>>>> {
    let kind = valid_kind(kind)?;
    let list = List {
        user_kind: UserKind::new(auth.admin_id, kind),
        order_by,
        pagination,
    };

    Ok(Json(ApiResponse::success(state.multi_files.find(&list).await?)))
}

/// 统计多文件数量
#[utoipa::path(
    get,
    path = "/api/files/multi/{kind}/count",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    responses((status = 200, description = "查询成功", body = CountResponse))
)]
pub async fn count_multi(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
) -> AppResult<Json<ApiResponse<CountResponse>>> {
    let kind = valid_kind(kind)?;
    let count = state
        .multi_files
        .count(&UserKind::new(auth.admin_id, kind))
        .await?;

    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// 按ID删除多文件，返回剩余数量
#[utoipa::path(
    delete,
    path = "/api/files/multi/{kind}",
    tag = "文件上传",
    params(("kind" = i64, Path, description = "文件分类，正整数")),
    request_body = DeleteFilesRequest,
    responses((status = 200, description = "删除成功", body = CountResponse))
)]
pub async fn delete_multi(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Path(kind): Path<Kind>,
    Json(request): Json<DeleteFilesRequest>,
) -> AppResult<Json<ApiResponse<CountResponse>>> {
    let kind = valid_kind(kind)?;
    let count = state
        .multi_files
        .delete(&UserKind::new(auth.admin_id, kind), &request.ids)
        .await?;

    Ok(Json(ApiResponse::success(CountResponse { count })))
}
