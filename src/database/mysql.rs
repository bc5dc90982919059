use super::{Database, Dialect, OrmConfig, PoolConfig, PoolOptionsSource};
use crate::error::AppResult;
use serde::{Deserialize, Serialize};

/// MySQL 数据库配置（`[mysql]`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    /// 连接参数，原样拼接到连接串的查询部分
    pub parameters: String,
    #[serde(flatten)]
    pub pool: PoolConfig,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            db_name: String::new(),
            parameters: "charset=utf8mb4".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl MysqlConfig {
    /// 数据库连接串
    pub fn dsn(&self) -> String {
        let mut dsn = format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.db_name
        );
        if !self.parameters.is_empty() {
            dsn.push('?');
            dsn.push_str(&self.parameters);
        }
        dsn
    }

    pub async fn connect(&self, orm: &OrmConfig) -> AppResult<Database> {
        Database::connect(
            &self.dsn(),
            Dialect::Mysql,
            PoolOptionsSource::Config(&self.pool),
            orm,
        )
        .await
    }
}
