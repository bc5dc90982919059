use super::{ServeUrlGetter, Storage, UrlResolver};
use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
};
use std::path::{Path, PathBuf};

/// 本地磁盘存储，所有文件平铺在同一目录下
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    serve_prefix: String,
    resolver: UrlResolver,
}

impl FileStorage {
    /// 创建本地存储，目录不存在时自动创建
    pub async fn new<P: AsRef<Path>>(dir: P, serve_prefix: &str) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!("本地存储目录: {}", dir.display());

        Ok(Self {
            dir,
            serve_prefix: serve_prefix.trim_end_matches('/').to_string(),
            resolver: UrlResolver::new(),
        })
    }

    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        Self::new(&config.dir, &config.serve_prefix).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, name: &str) -> AppResult<PathBuf> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(AppError::bad_request(format!("非法文件名: {}", name)));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    async fn create_file(&self, name: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_of(name)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("写入文件: {} ({} 字节)", path.display(), data.len());
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> AppResult<()> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("删除文件: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_file(&self, name: &str) -> AppResult<Vec<u8>> {
        let path = self.path_of(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::file_not_found(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn serve_url(&self, name: &str) -> AppResult<String> {
        self.resolver
            .resolve(name, |n| format!("{}/{}", self.serve_prefix, n))
    }

    fn set_serve_url_getter(&self, getter: ServeUrlGetter) {
        self.resolver.set(getter);
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(tokio::fs::metadata(&self.dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path().join("uploads"), "/files/")
            .await
            .unwrap();
        (temp, storage)
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (_temp, storage) = storage().await;

        storage.create_file("a.txt", b"hello").await.unwrap();
        assert_eq!(storage.get_file("a.txt").await.unwrap(), b"hello");

        storage.delete_file("a.txt").await.unwrap();
        assert!(matches!(
            storage.get_file("a.txt").await,
            Err(AppError::FileNotFound { .. })
        ));
        // 删除不存在的文件
        storage.delete_file("a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (_temp, storage) = storage().await;

        for name in ["../etc/passwd", "a/b.txt", "..", ""] {
            assert!(matches!(
                storage.create_file(name, b"x").await,
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_serve_url() {
        let (_temp, storage) = storage().await;
        assert_eq!(storage.serve_url("a.png").unwrap(), "/files/a.png");

        storage.set_serve_url_getter(Arc::new(|n: &str| Ok(format!("https://cdn/{}", n))));
        assert_eq!(storage.serve_url("a.png").unwrap(), "https://cdn/a.png");
        assert!(storage.health_check().await.unwrap());
    }
}
