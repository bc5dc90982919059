use crate::error::AppResult;
use std::time::Duration;

mod memory_storage;
mod redis_storage;

pub use memory_storage::MemoryStorage;
pub use redis_storage::RedisStorage;

/// 会话令牌存储
///
/// 令牌按用户分组保存，同一用户可同时持有多个令牌（多端登录）。
#[async_trait::async_trait]
pub trait SessionStorage: Send + Sync {
    /// 保存令牌
    async fn save_token(&self, user_id: &str, token: &str, expires: Duration) -> AppResult<()>;

    /// 检查令牌，令牌存在时刷新过期时间
    ///
    /// 读取与刷新是两次独立操作，两者之间令牌被删除时返回 `false`。
    async fn check_and_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expires: Duration,
    ) -> AppResult<bool>;

    /// 移除令牌
    async fn remove_token(&self, user_id: &str, token: &str) -> AppResult<()>;

    /// 移除用户的所有令牌
    async fn remove_user(&self, user_id: &str) -> AppResult<()>;

    /// 检查存储健康状态
    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

/// 令牌键：`<prefix><user_id>_<token>`
pub(crate) fn token_key(prefix: &str, user_id: &str, token: &str) -> String {
    format!("{}{}_{}", prefix, user_id, token)
}

/// 用户全部令牌键的公共前缀
pub(crate) fn user_key_prefix(prefix: &str, user_id: &str) -> String {
    format!("{}{}_", prefix, user_id)
}
