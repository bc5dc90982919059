use super::{AppState, auth::{AuthAdmin, read_token}};
use crate::{
    error::{AppError, AppResult},
    models::Admin,
    response::ApiResponse,
};
use axum::{
    Extension,
    extract::State,
    http::HeaderMap,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 用户名与密码
#[derive(Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub admin: Admin,
}

/// 修改密码请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// 新令牌
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// 管理员登录
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "管理员",
    request_body = Credentials,
    responses(
        (status = 200, description = "登录成功", body = LoginResponse),
        (status = 403, description = "用户名或密码错误")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let (admin, token) = state.admin.login(&request.username, &request.password).await?;

    Ok(Json(ApiResponse::success(LoginResponse { token, admin })))
}

/// 退出登录，令牌无效时同样返回成功
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "管理员",
    responses((status = 200, description = "已退出"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<ApiResponse<()>> {
    if let Some(token) = read_token(&headers, &state.config.session.header) {
        match state.admin.check_and_refresh_token(&token).await {
            Ok(Some(admin_id)) => {
                if let Err(e) = state.admin.logout(admin_id, &token).await {
                    tracing::warn!("移除令牌失败: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("退出时令牌无效: {}", e),
        }
    }

    Json(ApiResponse::<()>::message_success("已退出"))
}

/// 修改当前管理员密码，其它令牌全部失效
#[utoipa::path(
    post,
    path = "/api/admin/password",
    tag = "管理员",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "修改成功，返回新令牌", body = TokenResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<TokenResponse>>> {
    let token = state
        .admin
        .reset_password(auth.admin_id, &request.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// 当前管理员信息
#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "管理员",
    responses(
        (status = 200, description = "查询成功", body = Admin),
        (status = 401, description = "未授权")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let admin = state
        .admin
        .get_admin_by_id(auth.admin_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("管理员 {}", auth.admin_id)))?;

    Ok(Json(ApiResponse::success(admin)))
}

/// 创建管理员
#[utoipa::path(
    post,
    path = "/api/admin/register",
    tag = "管理员",
    request_body = Credentials,
    responses(
        (status = 200, description = "创建成功", body = Admin),
        (status = 409, description = "用户名已存在")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthAdmin>,
    Json(request): Json<Credentials>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let admin = state
        .admin
        .register_admin(&request.username, &request.password)
        .await?;
    tracing::info!("管理员 {} 创建了管理员 {}", auth.admin_id, admin.username);

    Ok(Json(ApiResponse::success(admin)))
}
