use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// 管理员模型
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Admin {
    /// 管理员ID
    pub id: i64,
    /// 用户名
    pub username: String,
    /// bcrypt 密码哈希，不对外输出
    #[serde(skip_serializing, default)]
    #[schema(write_only)]
    pub password: String,
}
