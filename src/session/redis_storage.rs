use super::{SessionStorage, token_key, user_key_prefix};
use crate::error::AppResult;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::time::Duration;

const SCAN_BATCH: usize = 200;

/// Redis 会话存储
#[derive(Clone)]
pub struct RedisStorage {
    conn: ConnectionManager,
    key_prefix: String,
}

impl std::fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStorage")
            .field("conn", &"<ConnectionManager>")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisStorage {
    pub fn new<P: Into<String>>(key_prefix: P, conn: ConnectionManager) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// 扫描指定前缀下的所有键
    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}

#[async_trait::async_trait]
impl SessionStorage for RedisStorage {
    async fn save_token(&self, user_id: &str, token: &str, expires: Duration) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = token_key(&self.key_prefix, user_id, token);
        let _: () = conn.set_ex(&key, "1", expires.as_secs()).await?;
        Ok(())
    }

    async fn check_and_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expires: Duration,
    ) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let key = token_key(&self.key_prefix, user_id, token);

        let saved: Option<String> = conn.get(&key).await?;
        if !is_live(saved.as_deref()) {
            return Ok(false);
        }

        let refreshed: redis::RedisResult<bool> =
            conn.expire(&key, expires.as_secs() as i64).await;
        Ok(refresh_outcome(refreshed))
    }

    async fn remove_token(&self, user_id: &str, token: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let key = token_key(&self.key_prefix, user_id, token);
        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn remove_user(&self, user_id: &str) -> AppResult<()> {
        let keys = self
            .scan_prefix(&user_key_prefix(&self.key_prefix, user_id))
            .await?;
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let _: () = conn.del(&keys).await?;
        tracing::info!("已移除用户 {} 的 {} 个会话", user_id, keys.len());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        match pong {
            Ok(pong) => Ok(pong == "PONG"),
            Err(e) => {
                tracing::error!("redis健康检查失败: {}", e);
                Ok(false)
            }
        }
    }
}

/// 会话键存在且值为 "1" 时有效
fn is_live(saved: Option<&str>) -> bool {
    saved == Some("1")
}

/// EXPIRE 返回 false 表示键已在 GET 之后过期
fn refresh_outcome(refreshed: redis::RedisResult<bool>) -> bool {
    match refreshed {
        Ok(refreshed) => refreshed,
        Err(e) => {
            // 刷新失败只缩短会话寿命，本次请求仍视为有效
            tracing::warn!("刷新会话过期时间失败: {}", e);
            true
        }
    }
}

/// 转义 glob 特殊字符，避免前缀被当作匹配模式
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
