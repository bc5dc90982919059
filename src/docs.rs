use crate::{
    handlers::{
        admin::{Credentials, LoginResponse, ResetPasswordRequest, TokenResponse},
        upload::{CountResponse, DeleteFilesRequest},
    },
    models::{Admin, MultiFile, SingleFile},
};
use axum::response::Html;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // 管理员API
        crate::handlers::admin::login,
        crate::handlers::admin::logout,
        crate::handlers::admin::reset_password,
        crate::handlers::admin::me,
        crate::handlers::admin::register,
        // 文件上传API
        crate::handlers::upload::create_single,
        crate::handlers::upload::get_single,
        crate::handlers::upload::delete_single,
        crate::handlers::upload::create_multi,
        crate::handlers::upload::list_multi,
        crate::handlers::upload::count_multi,
        crate::handlers::upload::delete_multi,
        crate::handlers::files::serve_file,
    ),
    components(
        schemas(
            Admin,
            Credentials,
            LoginResponse,
            ResetPasswordRequest,
            TokenResponse,
            SingleFile,
            MultiFile,
            CountResponse,
            DeleteFilesRequest,
        )
    ),
    tags(
        (name = "管理员", description = "管理员登录、退出、修改密码与创建"),
        (name = "文件上传", description = "单一文件与多文件的上传、查询和删除")
    ),
    info(
        title = "PanelKit API",
        version = "1.0.0",
        description = "PanelKit 管理后台 REST API 文档"
    ),
    servers(
        (url = "http://localhost:8080", description = "开发环境")
    )
)]
pub struct ApiDoc;

/// Swagger UI 页面（访问路径：/swagger-ui 或 /swagger-ui/）
/// OpenAPI JSON 路径：/api-docs/openapi.json
pub async fn swagger_ui_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset=UTF-8>
  <title>PanelKit API 文档</title>
  <link rel=stylesheet href=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui.css>
</head>
<body>
  <div id=swagger-ui></div>
  <script src=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui-bundle.js></script>
  <script>
    window.onload = function() {
      window.ui = SwaggerUIBundle({
        url: '/api-docs/openapi.json',
        dom_id: '#swagger-ui',
        deepLinking: true,
        validatorUrl: null
      });
    };
  </script>
</body>
</html>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/admin/login"));
        assert!(doc.paths.paths.contains_key("/api/files/multi/{kind}/count"));
    }
}
