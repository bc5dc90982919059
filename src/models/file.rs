use super::Kind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// 单一文件模型，同一用户的同种分类只对应一个文件
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SingleFile {
    pub id: i64,
    pub user_id: i64,
    pub kind: Kind,
    /// 存储中的文件名
    pub file: String,
    /// 文件服务地址，查询后填充
    #[sqlx(skip)]
    #[serde(default)]
    pub url: String,
}

/// 多文件模型，同一用户的同种分类可对应多个文件
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MultiFile {
    pub id: i64,
    pub user_id: i64,
    pub kind: Kind,
    pub file: String,
    #[sqlx(skip)]
    #[serde(default)]
    pub url: String,
}
