use super::AppState;
use crate::error::{AppError, AppResult};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// 已认证的管理员，由认证中间件写入请求扩展
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin_id: i64,
    pub token: String,
}

/// 从配置的请求头读取令牌，兼容 `Bearer ` 前缀
pub(crate) fn read_token(headers: &HeaderMap, header: &str) -> Option<String> {
    let value = headers.get(header)?.to_str().ok()?.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => value,
    };
    (!token.is_empty()).then(|| token.to_string())
}

/// 管理员认证中间件
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = read_token(request.headers(), &state.config.session.header)
        .ok_or(AppError::Unauthorized)?;

    let admin_id = state
        .admin
        .check_and_refresh_token(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request
        .extensions_mut()
        .insert(AuthAdmin { admin_id, token });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_read_token() {
        let mut headers = HeaderMap::new();
        assert!(read_token(&headers, "Authorization").is_none());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(read_token(&headers, "Authorization").as_deref(), Some("abc"));

        headers.insert("X-Token", HeaderValue::from_static(" raw "));
        assert_eq!(read_token(&headers, "x-token").as_deref(), Some("raw"));

        headers.insert("X-Token", HeaderValue::from_static("Bearer "));
        assert!(read_token(&headers, "X-Token").is_none());

        headers.insert("X-Token", HeaderValue::from_static("Bearer"));
        assert!(read_token(&headers, "X-Token").is_none());

        headers.insert("X-Token", HeaderValue::from_static("BearerToken"));
        assert_eq!(read_token(&headers, "X-Token").as_deref(), Some("BearerToken"));
    }
}
