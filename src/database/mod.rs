use crate::{
    config::Configs,
    error::{AppError, AppResult},
};
use serde::{Deserialize, Serialize};
use sqlx::{
    Any, AnyConnection, AnyPool, ConnectOptions, Row,
    any::{AnyArguments, AnyConnectOptions, AnyPoolOptions},
    query::Query,
};
use std::{str::FromStr, time::Duration};

mod mysql;
mod orm;
mod postgres;
mod sqlite;

pub use mysql::MysqlConfig;
pub use orm::{NamingStrategy, OrmConfig};
pub use postgres::PostgresConfig;
pub use sqlite::SqliteConfig;

/// 数据库类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Mysql,
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// 第 `n` 个绑定参数的占位符（从 1 开始）
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Mysql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// 从第 `start` 个参数开始的 `count` 个占位符，逗号分隔
    pub fn placeholders(&self, start: usize, count: usize) -> String {
        (start..start + count)
            .map(|n| self.placeholder(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 自增主键列定义
    pub fn id_column(&self) -> &'static str {
        match self {
            Dialect::Mysql => "id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY",
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }
}

impl FromStr for Dialect {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(AppError::config(format!("不支持的数据库类型: {}", other))),
        }
    }
}

/// 数据库连接池公共配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// 连接最长复用时间（秒），小于等于 0 时不限制
    pub max_lifetime: i64,
    /// 最多打开的连接数量，小于等于 0 时使用驱动默认值
    pub max_open_conns: i64,
    /// 连接池中保持的空闲连接数量，小于等于 0 时不保留，不会超过最大连接数
    pub max_idle_conns: i64,
}

impl PoolConfig {
    fn pool_options(&self) -> AnyPoolOptions {
        let mut options = AnyPoolOptions::new().acquire_timeout(Duration::from_secs(10));

        options = options.max_lifetime(
            (self.max_lifetime > 0).then(|| Duration::from_secs(self.max_lifetime as u64)),
        );
        if self.max_open_conns > 0 {
            options = options.max_connections(self.max_open_conns as u32);
        }
        let idle = self.max_idle_conns.max(0) as u32;
        let max = options.get_max_connections();
        options.min_connections(idle.min(max))
    }
}

/// 数据库连接池
///
/// 同一套 SQL 通过 `Any` 驱动运行在 MySQL、Postgres 与 SQLite 上，
/// 方言差异（占位符、自增主键、索引语法）由 [`Dialect`] 负责。
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
    naming: NamingStrategy,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool", &"<AnyPool>")
            .field("dialect", &self.dialect)
            .field("naming", &self.naming)
            .finish()
    }
}

impl Database {
    /// 按 `[database] dialect` 选择数据库，连接参数读取同名配置段，ORM 配置读取 `[orm]`
    pub async fn from_configs(configs: &Configs) -> AppResult<Self> {
        let dialect = configs
            .get_sub("database")?
            .get_str("dialect")
            .unwrap_or("mysql")
            .parse::<Dialect>()?;

        match dialect {
            Dialect::Mysql => Self::new_mysql("mysql", "orm", configs).await,
            Dialect::Postgres => Self::new_postgres("postgres", "orm", configs).await,
            Dialect::Sqlite => Self::new_sqlite("sqlite", "orm", configs).await,
        }
    }

    /// 读取 MySQL 与 ORM 配置段并建立连接
    pub async fn new_mysql(namespace: &str, orm_namespace: &str, configs: &Configs) -> AppResult<Self> {
        let config: MysqlConfig = configs.unmarshal_sub(namespace)?;
        let orm: OrmConfig = configs.unmarshal_sub(orm_namespace)?;
        config.connect(&orm).await
    }

    /// 读取 Postgres 与 ORM 配置段并建立连接
    pub async fn new_postgres(
        namespace: &str,
        orm_namespace: &str,
        configs: &Configs,
    ) -> AppResult<Self> {
        let config: PostgresConfig = configs.unmarshal_sub(namespace)?;
        let orm: OrmConfig = configs.unmarshal_sub(orm_namespace)?;
        config.connect(&orm).await
    }

    /// 读取 SQLite 与 ORM 配置段并建立连接
    pub async fn new_sqlite(namespace: &str, orm_namespace: &str, configs: &Configs) -> AppResult<Self> {
        let config: SqliteConfig = configs.unmarshal_sub(namespace)?;
        let orm: OrmConfig = configs.unmarshal_sub(orm_namespace)?;
        config.connect(&orm).await
    }

    /// 创建数据库连接池并测试连接
    pub(crate) async fn connect(
        url: &str,
        dialect: Dialect,
        pool: PoolOptionsSource<'_>,
        orm: &OrmConfig,
    ) -> AppResult<Self> {
        tracing::info!(
            "正在连接数据库({}): {}",
            dialect.name(),
            mask_database_url(url)
        );

        sqlx::any::install_default_drivers();

        let options = AnyConnectOptions::from_str(url)?.log_statements(orm.statement_level());
        let pool_options = match pool {
            PoolOptionsSource::Config(config) => config.pool_options(),
            PoolOptionsSource::SingleConnection => AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        };
        let max_connections = pool_options.get_max_connections();
        let pool = pool_options.connect_with(options).await?;

        // 测试连接
        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!("数据库连接成功，最大连接数: {}", max_connections);

        Ok(Self {
            pool,
            dialect,
            naming: orm.naming_strategy(),
        })
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 按命名策略生成表名
    pub fn table_name(&self, name: &str) -> String {
        self.naming.table_name(name)
    }

    /// 建表（不存在时）并创建单列索引
    pub async fn create_table(
        &self,
        table: &str,
        columns: &[&str],
        indexed_columns: &[&str],
    ) -> AppResult<()> {
        let mut definitions: Vec<String> = std::iter::once(self.dialect.id_column().to_string())
            .chain(columns.iter().map(|c| c.to_string()))
            .collect();

        // MySQL 不支持 CREATE INDEX IF NOT EXISTS，索引随建表语句一起声明
        if self.dialect == Dialect::Mysql {
            definitions.extend(
                indexed_columns
                    .iter()
                    .map(|c| format!("INDEX idx_{}_{} ({})", table, c, c)),
            );
        }

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table,
            definitions.join(", ")
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        if self.dialect != Dialect::Mysql {
            for column in indexed_columns {
                let ddl = format!(
                    "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {} ({})",
                    table, column, table, column
                );
                sqlx::query(&ddl).execute(&self.pool).await?;
            }
        }

        tracing::debug!("数据表已就绪: {}", table);
        Ok(())
    }

    /// 执行插入语句并返回自增主键
    ///
    /// Postgres 与 SQLite 的插入语句需带 `RETURNING id`（见 [`Database::returning_id`]），
    /// MySQL 读取 `last_insert_id`。
    pub async fn insert_returning_id<'q>(
        &self,
        query: Query<'q, Any, AnyArguments<'q>>,
        conn: &mut AnyConnection,
    ) -> AppResult<i64> {
        match self.dialect {
            Dialect::Mysql => {
                let result = query.execute(&mut *conn).await?;
                result
                    .last_insert_id()
                    .ok_or_else(|| AppError::service_unavailable("数据库未返回自增主键"))
            }
            Dialect::Postgres | Dialect::Sqlite => {
                let row = query.fetch_one(&mut *conn).await?;
                Ok(row.try_get::<i64, _>("id")?)
            }
        }
    }

    /// 插入语句的主键返回子句
    pub fn returning_id(&self) -> &'static str {
        match self.dialect {
            Dialect::Mysql => "",
            Dialect::Postgres | Dialect::Sqlite => " RETURNING id",
        }
    }

    /// 数据库初始化验证（版本检查）
    pub async fn verify_connection(&self) -> AppResult<()> {
        tracing::info!("正在验证数据库连接和版本...");

        let sql = match self.dialect {
            Dialect::Mysql | Dialect::Postgres => "SELECT version()",
            Dialect::Sqlite => "SELECT sqlite_version()",
        };
        let version = sqlx::query_scalar::<_, String>(sql)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("数据库版本: {}", version);
        tracing::info!("数据库连接验证完成");

        Ok(())
    }

    /// 检查数据库健康状态
    pub async fn health_check(&self) -> AppResult<bool> {
        let result = sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(result == 1)
    }

    /// 关闭数据库连接池
    pub async fn close(&self) {
        tracing::info!("正在关闭数据库连接池...");
        self.pool.close().await;
        tracing::info!("数据库连接池已关闭");
    }
}

/// 连接池参数来源
pub(crate) enum PoolOptionsSource<'a> {
    Config(&'a PoolConfig),
    /// 单连接且永不回收，内存数据库使用
    SingleConnection,
}

/// 隐藏数据库URL中的敏感信息
pub(crate) fn mask_database_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        // 查找协议部分后的第一个冒号位置
        if let Some(protocol_end) = url.find("://") {
            let auth_part = &url[protocol_end + 3..at_pos];
            if let Some(colon_pos) = auth_part.find(':') {
                // 找到了用户名:密码格式，需要掩码密码
                let mut masked = url.to_string();
                let password_start = protocol_end + 3 + colon_pos + 1;
                let password_end = at_pos;
                masked.replace_range(password_start..password_end, "***");
                return masked;
            }
        }
    }
    url.to_string()
}
