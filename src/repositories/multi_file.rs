use super::{FILE_COLUMNS, FILE_INDEXES, user_kind_filter};
use crate::{
    database::Database,
    error::AppResult,
    models::{List, MultiFile, UserKind},
};
use sqlx::AnyConnection;

/// 多文件仓库
#[derive(Debug, Clone)]
pub struct MultiFileRepository {
    db: Database,
    table: String,
}

impl MultiFileRepository {
    pub fn new(db: Database) -> Self {
        let table = db.table_name("multi_file");
        Self { db, table }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn migrate(&self) -> AppResult<()> {
        self.db
            .create_table(&self.table, FILE_COLUMNS, FILE_INDEXES)
            .await
    }

    /// 插入记录，返回新ID
    pub async fn insert(
        &self,
        conn: &mut AnyConnection,
        user_id: i64,
        kind: i64,
        file: &str,
    ) -> AppResult<i64> {
        let sql = format!(
            "INSERT INTO {} (user_id, kind, file) VALUES ({}){}",
            self.table,
            self.db.dialect().placeholders(1, 3),
            self.db.returning_id()
        );
        let query = sqlx::query(&sql).bind(user_id).bind(kind).bind(file);

        self.db.insert_returning_id(query, conn).await
    }

    /// 统计记录数
    pub async fn count(&self, user_kind: &UserKind) -> AppResult<i64> {
        let (filter, params) = user_kind_filter(self.db.dialect(), user_kind, 1);
        let sql = format!("SELECT COUNT(*) FROM {}{}", self.table, filter);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.fetch_one(self.db.pool()).await?)
    }

    /// 分页查询
    pub async fn find(&self, list: &List) -> AppResult<Vec<MultiFile>> {
        let (filter, params) = user_kind_filter(self.db.dialect(), &list.user_kind, 1);
        // 分页参数已归一化为整数，直接拼接
        let sql = format!(
            "SELECT id, user_id, kind, file FROM {}{}{} LIMIT {} OFFSET {}",
            self.table,
            filter,
            list.order_by.clause().unwrap_or_default(),
            list.pagination.limit(),
            list.pagination.offset()
        );

        let mut query = sqlx::query_as::<_, MultiFile>(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.fetch_all(self.db.pool()).await?)
    }

    /// 在用户与分类范围内按ID查找记录
    pub async fn find_by_ids(
        &self,
        conn: &mut AnyConnection,
        user_kind: &UserKind,
        ids: &[i64],
    ) -> AppResult<Vec<MultiFile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let (sql, params) = self.ids_statement("SELECT id, user_id, kind, file", user_kind, ids);
        let mut query = sqlx::query_as::<_, MultiFile>(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.fetch_all(&mut *conn).await?)
    }

    /// 在用户与分类范围内按ID删除记录
    pub async fn delete_by_ids(
        &self,
        conn: &mut AnyConnection,
        user_kind: &UserKind,
        ids: &[i64],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let (sql, params) = self.ids_statement("DELETE", user_kind, ids);
        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.execute(&mut *conn).await?.rows_affected())
    }

    fn ids_statement(&self, head: &str, user_kind: &UserKind, ids: &[i64]) -> (String, Vec<i64>) {
        let dialect = self.db.dialect();
        let (filter, mut params) = user_kind_filter(dialect, user_kind, 1);
        let in_list = dialect.placeholders(params.len() + 1, ids.len());
        let conjunction = if filter.is_empty() { " WHERE" } else { " AND" };

        let sql = format!(
            "{} FROM {}{}{} id IN ({})",
            head, self.table, filter, conjunction, in_list
        );
        params.extend_from_slice(ids);
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderBy, Pagination};

    async fn repo() -> MultiFileRepository {
        use crate::database::{OrmConfig, tests::memory_database};

        let repo = MultiFileRepository::new(memory_database(OrmConfig::default()).await);
        repo.migrate().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_find_with_order_and_pagination() {
        let repo = repo().await;
        let mut conn = repo.database().pool().acquire().await.unwrap();
        for name in ["a", "b", "c", "d"] {
            repo.insert(&mut conn, 1, 5, name).await.unwrap();
        }
        repo.insert(&mut conn, 2, 5, "other").await.unwrap();
        drop(conn);

        let list = List {
            user_kind: UserKind::new(1, 5),
            order_by: OrderBy {
                order_by: "id".to_string(),
                descending: true,
            },
            pagination: Pagination { limit: 2, offset: 1 },
        };
        let files = repo.find(&list).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);

        assert_eq!(repo.count(&UserKind::new(0, 5)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_user_kind() {
        let repo = repo().await;
        let mut conn = repo.database().pool().acquire().await.unwrap();
        let mine = repo.insert(&mut conn, 1, 5, "mine").await.unwrap();
        let theirs = repo.insert(&mut conn, 2, 5, "theirs").await.unwrap();

        let user_kind = UserKind::new(1, 5);
        let found = repo
            .find_by_ids(&mut conn, &user_kind, &[mine, theirs])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let deleted = repo
            .delete_by_ids(&mut conn, &user_kind, &[mine, theirs])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.delete_by_ids(&mut conn, &user_kind, &[]).await.unwrap(), 0);
        drop(conn);

        assert_eq!(repo.count(&UserKind::new(2, 5)).await.unwrap(), 1);
    }
}
