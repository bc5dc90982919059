use crate::{
    docs::{ApiDoc, swagger_ui_page},
    handlers::{
        AppState,
        admin::{login, logout, me, register, reset_password},
        files::serve_file,
        health::{db_health_check, health_check, session_health_check, storage_health_check},
        require_admin,
        upload::{
            count_multi, create_multi, create_single, delete_multi, delete_single, get_single,
            list_multi,
        },
    },
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    response::Json,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// 创建API路由
pub fn create_api_routes(state: &AppState) -> Router<AppState> {
    // 需要登录的接口
    let protected = Router::new()
        .route("/api/admin/password", post(reset_password))
        .route("/api/admin/me", get(me))
        .route("/api/admin/register", post(register))
        .route(
            "/api/files/single/{kind}",
            post(create_single).get(get_single).delete(delete_single),
        )
        .route(
            "/api/files/multi/{kind}",
            post(create_multi).get(list_multi).delete(delete_multi),
        )
        .route("/api/files/multi/{kind}/count", get(count_multi))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut router = Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .merge(protected);

    // 本地存储由本服务提供文件访问
    let storage = &state.config.storage;
    if storage.backend == "local" && storage.serve_prefix.starts_with('/') {
        let path = format!("{}/{{name}}", storage.serve_prefix.trim_end_matches('/'));
        router = router.route(&path, get(serve_file));
    }

    router
}

/// 创建完整应用：健康检查、文档、业务路由与中间件
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);
    let body_limit = state.config.server.max_body_size as usize;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/health/db", get(db_health_check))
        .route("/api/health/session", get(session_health_check))
        .route("/api/health/storage", get(storage_health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/swagger-ui", get(swagger_ui_page))
        .route("/swagger-ui/", get(swagger_ui_page))
        .merge(create_api_routes(&state))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
