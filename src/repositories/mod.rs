pub mod admin;
pub mod multi_file;
pub mod single_file;

pub use admin::AdminRepository;
pub use multi_file::MultiFileRepository;
pub use single_file::SingleFileRepository;

use crate::{database::Dialect, models::UserKind};

/// 文件表公共列定义
pub(crate) const FILE_COLUMNS: &[&str] = &[
    "user_id BIGINT NOT NULL",
    "kind BIGINT NOT NULL",
    "file VARCHAR(255) NOT NULL",
];

/// 文件表索引列
pub(crate) const FILE_INDEXES: &[&str] = &["user_id", "kind"];

/// 按用户与分类生成过滤条件，0 值字段不参与过滤
///
/// 返回的子句以 ` WHERE` 开头（无条件时为空），参数从第 `start` 个占位符开始编号。
pub(crate) fn user_kind_filter(dialect: Dialect, user_kind: &UserKind, start: usize) -> (String, Vec<i64>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for (column, value) in [("user_id", user_kind.user_id), ("kind", user_kind.kind)] {
        if value != 0 {
            conditions.push(format!(
                "{} = {}",
                column,
                dialect.placeholder(start + params.len())
            ));
            params.push(value);
        }
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_kind_filter() {
        let (sql, params) = user_kind_filter(Dialect::Postgres, &UserKind::new(3, 7), 1);
        assert_eq!(sql, " WHERE user_id = $1 AND kind = $2");
        assert_eq!(params, vec![3, 7]);

        let (sql, params) = user_kind_filter(Dialect::Mysql, &UserKind::new(0, 7), 1);
        assert_eq!(sql, " WHERE kind = ?");
        assert_eq!(params, vec![7]);

        let (sql, params) = user_kind_filter(Dialect::Sqlite, &UserKind::default(), 1);
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }
}
