use crate::{database::Database, error::AppResult, models::Admin};

/// 管理员仓库
#[derive(Debug, Clone)]
pub struct AdminRepository {
    db: Database,
    table: String,
}

impl AdminRepository {
    pub fn new(db: Database) -> Self {
        let table = db.table_name("admin");
        Self { db, table }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// 建表
    pub async fn migrate(&self) -> AppResult<()> {
        self.db
            .create_table(
                &self.table,
                &["username VARCHAR(191) NOT NULL", "password VARCHAR(255) NOT NULL"],
                &["username"],
            )
            .await
    }

    /// 根据用户名查找管理员
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<Admin>> {
        let sql = format!(
            "SELECT id, username, password FROM {} WHERE username = {}",
            self.table,
            self.db.dialect().placeholder(1)
        );
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(admin)
    }

    /// 根据ID查找管理员
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Admin>> {
        let sql = format!(
            "SELECT id, username, password FROM {} WHERE id = {}",
            self.table,
            self.db.dialect().placeholder(1)
        );
        let admin = sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(admin)
    }

    /// 插入管理员，返回新ID
    pub async fn insert(&self, username: &str, password_hash: &str) -> AppResult<i64> {
        let sql = format!(
            "INSERT INTO {} (username, password) VALUES ({}){}",
            self.table,
            self.db.dialect().placeholders(1, 2),
            self.db.returning_id()
        );
        let mut conn = self.db.pool().acquire().await?;
        let query = sqlx::query(&sql).bind(username).bind(password_hash);

        self.db.insert_returning_id(query, &mut *conn).await
    }

    /// 更新密码哈希，返回是否命中
    pub async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<bool> {
        let sql = format!(
            "UPDATE {} SET password = {} WHERE id = {}",
            self.table,
            self.db.dialect().placeholder(1),
            self.db.dialect().placeholder(2)
        );
        let result = sqlx::query(&sql)
            .bind(password_hash)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{OrmConfig, tests::memory_database};

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = AdminRepository::new(memory_database(OrmConfig::default()).await);
        repo.migrate().await.unwrap();
        assert_eq!(repo.table(), "admins");

        let id = repo.insert("root", "hash").await.unwrap();
        let admin = repo.find_by_username("root").await.unwrap().unwrap();
        assert_eq!(admin.id, id);
        assert_eq!(admin.password, "hash");

        assert!(repo.update_password(id, "hash2").await.unwrap());
        assert!(!repo.update_password(id + 100, "hash3").await.unwrap());
        assert_eq!(repo.find_by_id(id).await.unwrap().unwrap().password, "hash2");
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_table_prefix_and_singular() {
        let orm = OrmConfig {
            table_prefix: "pk_".to_string(),
            singular_table: true,
            ..Default::default()
        };
        let repo = AdminRepository::new(memory_database(orm).await);
        repo.migrate().await.unwrap();
        assert_eq!(repo.table(), "pk_admin");
    }
}
