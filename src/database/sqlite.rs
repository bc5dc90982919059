use super::{Database, Dialect, OrmConfig, PoolConfig, PoolOptionsSource};
use crate::error::AppResult;
use serde::{Deserialize, Serialize};

/// SQLite 数据库配置（`[sqlite]`），用于本地开发与测试
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub url: String,
    #[serde(flatten)]
    pub pool: PoolConfig,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://panelkit.db?mode=rwc".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl SqliteConfig {
    /// 内存数据库
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            pool: PoolConfig::default(),
        }
    }

    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub async fn connect(&self, orm: &OrmConfig) -> AppResult<Database> {
        // 内存数据库的数据随连接释放而丢失，只能使用单个常驻连接
        let pool = if self.is_memory() {
            PoolOptionsSource::SingleConnection
        } else {
            PoolOptionsSource::Config(&self.pool)
        };
        Database::connect(&self.url, Dialect::Sqlite, pool, orm).await
    }
}
