use crate::{
    auth::TokenCipher,
    config::{AdminConfig, SessionConfig},
    database::Database,
    error::{AppError, AppResult},
    models::Admin,
    repositories::AdminRepository,
    session::SessionStorage,
};
use std::{sync::Arc, time::Duration};

/// bcrypt 计算强度
pub const BCRYPT_COST: u32 = 10;

/// 管理员认证服务
///
/// 令牌由 [`TokenCipher`] 加密管理员ID生成，并保存在会话存储中；
/// 令牌有效需要同时满足能够解密且在会话存储中未过期。
#[derive(Clone)]
pub struct AdminService {
    repo: AdminRepository,
    session: Arc<dyn SessionStorage>,
    cipher: Arc<TokenCipher>,
    expires: Duration,
}

impl AdminService {
    pub fn new(
        db: Database,
        session: Arc<dyn SessionStorage>,
        config: &SessionConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            repo: AdminRepository::new(db),
            session,
            cipher: Arc::new(TokenCipher::new(config.aes_key.as_bytes())?),
            expires: Duration::from_secs(config.expires_secs),
        })
    }

    pub async fn migrate(&self) -> AppResult<()> {
        self.repo.migrate().await
    }

    /// 注册管理员
    pub async fn register_admin(&self, username: &str, password: &str) -> AppResult<Admin> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::bad_request("用户名和密码不能为空"));
        }
        if self.repo.find_by_username(username).await?.is_some() {
            return Err(AppError::UsernameAlreadyExists);
        }

        let hash = hash_password(password).await?;
        let id = self.repo.insert(username, &hash).await?;
        tracing::info!("注册管理员: {} (id={})", username, id);

        Ok(Admin {
            id,
            username: username.to_string(),
            password: hash,
        })
    }

    /// 登录，返回管理员与新令牌
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(Admin, String)> {
        let admin = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::MismatchedCredentials)?;

        if !verify_password(password, &admin.password).await? {
            return Err(AppError::MismatchedCredentials);
        }

        let token = self.issue_token(admin.id).await?;
        tracing::info!("管理员登录: {} (id={})", admin.username, admin.id);

        Ok((admin, token))
    }

    /// 检查令牌并刷新过期时间，令牌无效时返回 `None`
    pub async fn check_and_refresh_token(&self, token: &str) -> AppResult<Option<i64>> {
        let admin_id = self.cipher.decode_token(token)?;
        let live = self
            .session
            .check_and_refresh_token(&admin_id.to_string(), token, self.expires)
            .await?;

        Ok(live.then_some(admin_id))
    }

    /// 重置密码，使该管理员的全部令牌失效，返回新令牌
    pub async fn reset_password(&self, admin_id: i64, new_password: &str) -> AppResult<String> {
        if new_password.is_empty() {
            return Err(AppError::bad_request("密码不能为空"));
        }

        let hash = hash_password(new_password).await?;
        if !self.repo.update_password(admin_id, &hash).await? {
            return Err(AppError::not_found(format!("管理员 {}", admin_id)));
        }

        self.session.remove_user(&admin_id.to_string()).await?;
        tracing::info!("管理员 {} 已重置密码，旧令牌全部失效", admin_id);

        self.issue_token(admin_id).await
    }

    /// 退出登录，移除单个令牌
    pub async fn logout(&self, admin_id: i64, token: &str) -> AppResult<()> {
        self.session
            .remove_token(&admin_id.to_string(), token)
            .await?;
        tracing::info!("管理员 {} 已退出", admin_id);
        Ok(())
    }

    pub async fn get_admin_by_id(&self, admin_id: i64) -> AppResult<Option<Admin>> {
        self.repo.find_by_id(admin_id).await
    }

    pub async fn get_admin_by_username(&self, username: &str) -> AppResult<Option<Admin>> {
        self.repo.find_by_username(username).await
    }

    /// 创建初始管理员，用户名已存在时跳过
    pub async fn ensure_bootstrap_admin(&self, config: &AdminConfig) -> AppResult<()> {
        if !config.is_set() {
            return Ok(());
        }

        match self.register_admin(&config.username, &config.password).await {
            Ok(_) => Ok(()),
            Err(AppError::UsernameAlreadyExists) => {
                tracing::debug!("初始管理员已存在: {}", config.username);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// 会话存储健康状态
    pub async fn session_health(&self) -> AppResult<bool> {
        self.session.health_check().await
    }

    async fn issue_token(&self, admin_id: i64) -> AppResult<String> {
        let token = self.cipher.encode_token(admin_id)?;
        self.session
            .save_token(&admin_id.to_string(), &token, self.expires)
            .await?;
        Ok(token)
    }
}

async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(Into::into)
}

async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    Ok(matched)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        database::{OrmConfig, tests::memory_database},
        session::MemoryStorage,
    };

    pub(crate) async fn admin_service() -> AdminService {
        let db = memory_database(OrmConfig::default()).await;
        let session = Arc::new(MemoryStorage::new("test:admin:"));
        let service = AdminService::new(db, session, &SessionConfig::default()).unwrap();
        service.migrate().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let service = admin_service().await;
        service.register_admin("root", "secret").await.unwrap();

        assert!(matches!(
            service.register_admin("root", "other").await,
            Err(AppError::UsernameAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_mismatched_credentials() {
        let service = admin_service().await;
        service.register_admin("root", "secret").await.unwrap();

        assert!(matches!(
            service.login("root", "wrong").await,
            Err(AppError::MismatchedCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "secret").await,
            Err(AppError::MismatchedCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_token_resolves_admin() {
        let service = admin_service().await;
        let admin = service.register_admin("root", "secret").await.unwrap();

        let (logged_in, token) = service.login("root", "secret").await.unwrap();
        assert_eq!(logged_in.id, admin.id);
        assert_eq!(
            service.check_and_refresh_token(&token).await.unwrap(),
            Some(admin.id)
        );

        service.logout(admin.id, &token).await.unwrap();
        assert_eq!(service.check_and_refresh_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reset_password_invalidates_tokens() {
        let service = admin_service().await;
        let admin = service.register_admin("root", "secret").await.unwrap();
        let (_, first) = service.login("root", "secret").await.unwrap();
        let (_, second) = service.login("root", "secret").await.unwrap();

        let fresh = service.reset_password(admin.id, "changed").await.unwrap();

        assert_eq!(service.check_and_refresh_token(&first).await.unwrap(), None);
        assert_eq!(service.check_and_refresh_token(&second).await.unwrap(), None);
        assert_eq!(
            service.check_and_refresh_token(&fresh).await.unwrap(),
            Some(admin.id)
        );
        assert!(service.login("root", "secret").await.is_err());
        service.login("root", "changed").await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let service = admin_service().await;
        let config = AdminConfig {
            username: "boot".to_string(),
            password: "strap".to_string(),
        };

        service.ensure_bootstrap_admin(&config).await.unwrap();
        service.ensure_bootstrap_admin(&config).await.unwrap();
        assert!(service.get_admin_by_username("boot").await.unwrap().is_some());

        service
            .ensure_bootstrap_admin(&AdminConfig::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_not_a_credential_mismatch() {
        let service = admin_service().await;
        service.repo.insert("broken", "not-a-bcrypt-hash").await.unwrap();

        assert!(matches!(
            service.login("broken", "secret").await,
            Err(AppError::Hash(_))
        ));
    }

    #[tokio::test]
    async fn test_undecryptable_token() {
        let service = admin_service().await;
        assert!(matches!(
            service.check_and_refresh_token("garbage").await,
            Err(AppError::InvalidToken(_))
        ));
    }
}
