pub mod local;
pub mod minio;

pub use local::FileStorage;
pub use minio::MinioStorage;

use crate::error::AppResult;
use rand::{Rng, distr::Alphanumeric};
use std::{
    path::Path,
    sync::{Arc, RwLock},
};

/// 随机文件名长度（不含扩展名）
pub const RANDOM_NAME_LEN: usize = 18;

/// 文件服务地址生成函数
pub type ServeUrlGetter = Arc<dyn Fn(&str) -> AppResult<String> + Send + Sync>;

/// 存储抽象接口
///
/// 存储中的文件以扁平文件名寻址，文件服务地址通过可替换的生成函数得到，
/// 切换本地服务与远程服务不需要改动数据层。
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 写入文件，同名文件被覆盖
    async fn create_file(&self, name: &str, data: &[u8]) -> AppResult<()>;

    /// 删除文件，文件不存在时视为成功
    async fn delete_file(&self, name: &str) -> AppResult<()>;

    /// 读取文件
    async fn get_file(&self, name: &str) -> AppResult<Vec<u8>>;

    /// 文件服务地址
    fn serve_url(&self, name: &str) -> AppResult<String>;

    /// 替换文件服务地址生成函数
    fn set_serve_url_getter(&self, getter: ServeUrlGetter);

    /// 检查存储健康状态
    async fn health_check(&self) -> AppResult<bool>;
}

/// 可替换的地址生成函数，未设置时使用后端默认规则
pub(crate) struct UrlResolver {
    getter: RwLock<Option<ServeUrlGetter>>,
}

impl UrlResolver {
    pub(crate) fn new() -> Self {
        Self {
            getter: RwLock::new(None),
        }
    }

    pub(crate) fn set(&self, getter: ServeUrlGetter) {
        let mut slot = self.getter.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(getter);
    }

    pub(crate) fn resolve<F>(&self, name: &str, default: F) -> AppResult<String>
    where
        F: FnOnce(&str) -> String,
    {
        let getter = self
            .getter
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match getter {
            Some(getter) => getter(name),
            None => Ok(default(name)),
        }
    }
}

impl std::fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let custom = self
            .getter
            .read()
            .map(|g| g.is_some())
            .unwrap_or(false);
        f.debug_struct("UrlResolver").field("custom", &custom).finish()
    }
}

/// 生成存储文件名：18 位随机字母数字加原文件扩展名
pub fn random_file_name(original: &str) -> String {
    let stem: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect();

    match Path::new(original).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem,
    }
}
