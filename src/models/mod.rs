pub mod admin;
pub mod file;

pub use admin::*;
pub use file::*;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 文件分类
pub type Kind = i64;

/// 单次查询的默认与最大条数
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 500;

/// 可排序字段
const ORDERABLE_COLUMNS: &[&str] = &["id", "user_id", "kind", "file"];

/// 用户与分类限制条件，0 表示不限制
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKind {
    pub user_id: i64,
    pub kind: Kind,
}

impl UserKind {
    pub fn new(user_id: i64, kind: Kind) -> Self {
        Self { user_id, kind }
    }
}

/// 分页参数
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    #[serde(default, deserialize_with = "deserialize_string_to_i64")]
    pub limit: i64,
    #[serde(default, deserialize_with = "deserialize_string_to_i64")]
    pub offset: i64,
}

impl Pagination {
    /// 条数不在 1..=500 内时使用默认值 10
    pub fn limit(&self) -> i64 {
        if self.limit <= 0 || self.limit > MAX_LIMIT {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }
}

/// 排序参数
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct OrderBy {
    /// 排序字段（id/user_id/kind/file），为空时不排序
    #[serde(default)]
    pub order_by: String,
    /// 逆序
    #[serde(default, deserialize_with = "deserialize_string_to_bool")]
    pub descending: bool,
}

impl OrderBy {
    /// 生成 ORDER BY 子句，未知字段忽略
    pub fn clause(&self) -> Option<String> {
        if self.order_by.is_empty() {
            return None;
        }
        if !ORDERABLE_COLUMNS.contains(&self.order_by.as_str()) {
            tracing::warn!("忽略未知的排序字段: {}", self.order_by);
            return None;
        }
        Some(format!(
            " ORDER BY {} {}",
            self.order_by,
            if self.descending { "DESC" } else { "ASC" }
        ))
    }
}

/// 多文件列表查询条件
#[derive(Debug, Clone, Default)]
pub struct List {
    pub user_kind: UserKind,
    pub order_by: OrderBy,
    pub pagination: Pagination,
}

fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrI64Visitor;

    impl<'de> Visitor<'de> for StringOrI64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or i64")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(value).map_err(|_| E::custom(format!("i64 overflow: {}", value)))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(StringOrI64Visitor)
}

fn deserialize_string_to_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct StringOrBoolVisitor;

    impl<'de> Visitor<'de> for StringOrBoolVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or bool")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(StringOrBoolVisitor)
}
