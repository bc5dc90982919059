use super::{FILE_COLUMNS, FILE_INDEXES, user_kind_filter};
use crate::{
    database::Database,
    error::AppResult,
    models::{Kind, SingleFile, UserKind},
};
use sqlx::AnyConnection;

/// 单一文件仓库
#[derive(Debug, Clone)]
pub struct SingleFileRepository {
    db: Database,
    table: String,
}

impl SingleFileRepository {
    pub fn new(db: Database) -> Self {
        let table = db.table_name("single_file");
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

    /// 查找用户与分类下的文件，用户与分类均精确匹配
    pub async fn first(&self, user_id: i64, kind: Kind) -> AppResult<Option<SingleFile>> {
        let sql = format!(
            "SELECT id, user_id, kind, file FROM {} WHERE user_id = {} AND kind = {} ORDER BY id",
            self.table,
            self.db.dialect().placeholder(1),
            self.db.dialect().placeholder(2)
        );

        let file = sqlx::query_as::<_, SingleFile>(&sql)
            .bind(user_id)
            .bind(kind)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(file)
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

    /// 按ID删除记录
    pub async fn delete_by_id(&self, conn: &mut AnyConnection, id: i64) -> AppResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE id = {}",
            self.table,
            self.db.dialect().placeholder(1)
        );
        let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

        Ok(result.rows_affected())
    }

    /// 统计用户与分类下的记录数
    pub async fn count(&self, user_kind: &UserKind) -> AppResult<i64> {
        let (filter, params) = user_kind_filter(self.db.dialect(), user_kind, 1);
        let sql = format!("SELECT COUNT(*) FROM {}{}", self.table, filter);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.fetch_one(self.db.pool()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{OrmConfig, tests::memory_database};

    #[tokio::test]
    async fn test_insert_first_delete() {
        let repo = SingleFileRepository::new(memory_database(OrmConfig::default()).await);
        repo.migrate().await.unwrap();

        let mut conn = repo.database().pool().acquire().await.unwrap();
        let id = repo.insert(&mut conn, 1, 2, "a.png").await.unwrap();
        repo.insert(&mut conn, 1, 3, "b.png").await.unwrap();
        drop(conn);

        let file = repo.first(1, 2).await.unwrap().unwrap();
        assert_eq!(file.id, id);
        assert_eq!(file.file, "a.png");
        assert!(file.url.is_empty());
        assert_eq!(repo.count(&UserKind::new(1, 0)).await.unwrap(), 2);

        let mut conn = repo.database().pool().acquire().await.unwrap();
        assert_eq!(repo.delete_by_id(&mut conn, id).await.unwrap(), 1);
        drop(conn);
        assert!(repo.first(1, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_matches_kind_zero_exactly() {
        let repo = SingleFileRepository::new(memory_database(OrmConfig::default()).await);
        repo.migrate().await.unwrap();

        let mut conn = repo.database().pool().acquire().await.unwrap();
        repo.insert(&mut conn, 1, 2, "a.png").await.unwrap();
        drop(conn);

        assert!(repo.first(1, 0).await.unwrap().is_none());
        assert!(repo.first(0, 2).await.unwrap().is_none());
    }
}
