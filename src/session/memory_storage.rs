use super::{SessionStorage, token_key, user_key_prefix};
use crate::error::AppResult;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

/// 进程内会话存储，适用于单实例部署与测试
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    key_prefix: String,
    // 键 -> 过期时刻
    tokens: Arc<RwLock<HashMap<String, Instant>>>,
}

impl MemoryStorage {
    pub fn new<P: Into<String>>(key_prefix: P) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 当前未过期的令牌数量
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.tokens
            .read()
            .await
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl SessionStorage for MemoryStorage {
    async fn save_token(&self, user_id: &str, token: &str, expires: Duration) -> AppResult<()> {
        let key = token_key(&self.key_prefix, user_id, token);
        let mut tokens = self.tokens.write().await;
        let now = Instant::now();
        tokens.retain(|_, deadline| *deadline > now);
        tokens.insert(key, now + expires);
        Ok(())
    }

    async fn check_and_refresh_token(
        &self,
        user_id: &str,
        token: &str,
        expires: Duration,
    ) -> AppResult<bool> {
        let key = token_key(&self.key_prefix, user_id, token);
        let mut tokens = self.tokens.write().await;
        let now = Instant::now();

        let live = match tokens.get_mut(&key) {
            Some(deadline) if *deadline > now => {
                *deadline = now + expires;
                true
            }
            _ => false,
        };
        if !live {
            tokens.remove(&key);
        }
        Ok(live)
    }

    async fn remove_token(&self, user_id: &str, token: &str) -> AppResult<()> {
        let key = token_key(&self.key_prefix, user_id, token);
        self.tokens.write().await.remove(&key);
        Ok(())
    }

    async fn remove_user(&self, user_id: &str) -> AppResult<()> {
        let prefix = user_key_prefix(&self.key_prefix, user_id);
        self.tokens
            .write()
            .await
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_save_and_check() {
        let storage = MemoryStorage::new("admin:");
        storage.save_token("1", "tok", TTL).await.unwrap();

        assert!(storage.check_and_refresh_token("1", "tok", TTL).await.unwrap());
        assert!(!storage.check_and_refresh_token("2", "tok", TTL).await.unwrap());
        assert!(!storage.check_and_refresh_token("1", "other", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let storage = MemoryStorage::new("admin:");
        storage
            .save_token("1", "tok", Duration::from_millis(10))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!storage.check_and_refresh_token("1", "tok", TTL).await.unwrap());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_extends_deadline() {
        let storage = MemoryStorage::new("admin:");
        storage
            .save_token("1", "tok", Duration::from_millis(50))
            .await
            .unwrap();

        assert!(storage.check_and_refresh_token("1", "tok", TTL).await.unwrap());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(storage.check_and_refresh_token("1", "tok", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_token_and_user() {
        let storage = MemoryStorage::new("admin:");
        storage.save_token("1", "a", TTL).await.unwrap();
        storage.save_token("1", "b", TTL).await.unwrap();
        storage.save_token("12", "c", TTL).await.unwrap();

        storage.remove_token("1", "a").await.unwrap();
        assert!(!storage.check_and_refresh_token("1", "a", TTL).await.unwrap());
        assert!(storage.check_and_refresh_token("1", "b", TTL).await.unwrap());

        storage.remove_user("1").await.unwrap();
        assert!(!storage.check_and_refresh_token("1", "b", TTL).await.unwrap());
        assert!(storage.check_and_refresh_token("12", "c", TTL).await.unwrap());
        assert_eq!(storage.len().await, 1);
    }
}
