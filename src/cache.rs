use crate::{config::Configs, database::mask_database_url, error::AppResult};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

/// redis 数据库配置（`[redis]`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// redis 地址
    pub addr: String,
    /// redis 密码
    pub password: String,
    /// db 索引
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(&self.password),
                self.addr,
                self.db
            )
        }
    }

    /// 建立连接并 PING
    pub async fn connect(&self) -> AppResult<ConnectionManager> {
        let url = self.url();
        tracing::info!("正在连接redis: {}", mask_database_url(&url));

        let client = redis::Client::open(url)?;
        let mut manager = ConnectionManager::new(client).await?;
        let pong: String = redis::cmd("PING").query_async(&mut manager).await?;

        tracing::info!("redis连接成功: {}", pong);
        Ok(manager)
    }

    /// 读取配置段并建立连接
    pub async fn new_client(namespace: &str, configs: &Configs) -> AppResult<ConnectionManager> {
        let config: RedisConfig = configs.unmarshal_sub(namespace)?;
        config.connect().await
    }
}
