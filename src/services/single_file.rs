use crate::{
    database::Database,
    error::AppResult,
    models::{Kind, SingleFile},
    repositories::SingleFileRepository,
    storage::{ServeUrlGetter, Storage, random_file_name},
};
use std::sync::Arc;

/// 单一文件管理：同一用户的同种分类只保留一个文件
#[derive(Clone)]
pub struct SingleFileService {
    repo: SingleFileRepository,
    storage: Arc<dyn Storage>,
}

impl SingleFileService {
    pub fn new(db: Database, storage: Arc<dyn Storage>) -> Self {
        Self {
            repo: SingleFileRepository::new(db),
            storage,
        }
    }

    pub async fn migrate(&self) -> AppResult<()> {
        self.repo.migrate().await
    }

    /// 查找文件并填充服务地址
    pub async fn first(&self, user_id: i64, kind: Kind) -> AppResult<Option<SingleFile>> {
        let Some(mut file) = self.repo.first(user_id, kind).await? else {
            return Ok(None);
        };
        file.url = self.storage.serve_url(&file.file)?;
        Ok(Some(file))
    }

    /// 上传文件，已有文件先删除
    pub async fn create(
        &self,
        user_id: i64,
        kind: Kind,
        original_name: &str,
        data: &[u8],
    ) -> AppResult<SingleFile> {
        if let Some(old) = self.repo.first(user_id, kind).await? {
            self.remove(&old).await?;
        }

        let name = random_file_name(original_name);
        let mut tx = self.repo.database().pool().begin().await?;
        let id = self.repo.insert(&mut tx, user_id, kind, &name).await?;
        // 写入失败时事务随 tx 丢弃回滚
        self.storage.create_file(&name, data).await?;

        if let Err(e) = tx.commit().await {
            if let Err(cleanup) = self.storage.delete_file(&name).await {
                tracing::warn!("回滚时删除文件失败: {}: {}", name, cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(
            "单一文件已保存: user={} kind={} file={} ({} 字节)",
            user_id,
            kind,
            name,
            data.len()
        );

        Ok(SingleFile {
            id,
            user_id,
            kind,
            url: self.storage.serve_url(&name)?,
            file: name,
        })
    }

    /// 删除文件，返回是否存在
    pub async fn delete(&self, user_id: i64, kind: Kind) -> AppResult<bool> {
        match self.repo.first(user_id, kind).await? {
            Some(file) => {
                self.remove(&file).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn get_file(&self, name: &str) -> AppResult<Vec<u8>> {
        self.storage.get_file(name).await
    }

    pub fn serve_url(&self, name: &str) -> AppResult<String> {
        self.storage.serve_url(name)
    }

    pub fn set_serve_url_getter(&self, getter: ServeUrlGetter) {
        self.storage.set_serve_url_getter(getter);
    }

    // 记录与文件一起删除，文件删除失败时记录回滚
    async fn remove(&self, file: &SingleFile) -> AppResult<()> {
        let mut tx = self.repo.database().pool().begin().await?;
        self.repo.delete_by_id(&mut tx, file.id).await?;
        self.storage.delete_file(&file.file).await?;
        tx.commit().await?;

        tracing::debug!("单一文件已删除: {}", file.file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{OrmConfig, tests::memory_database},
        models::UserKind,
        storage::FileStorage,
    };
    use tempfile::TempDir;

    async fn service() -> (TempDir, SingleFileService) {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path(), "/files").await.unwrap();
        let service = SingleFileService::new(
            memory_database(OrmConfig::default()).await,
            Arc::new(storage),
        );
        service.migrate().await.unwrap();
        (temp, service)
    }

    fn blob_count(temp: &TempDir) -> usize {
        std::fs::read_dir(temp.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_create_twice_keeps_one() {
        let (temp, service) = service().await;

        let first = service.create(1, 2, "a.png", b"first").await.unwrap();
        let second = service.create(1, 2, "b.png", b"second").await.unwrap();
        assert_ne!(first.file, second.file);
        assert_eq!(second.url, format!("/files/{}", second.file));

        let current = service.first(1, 2).await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
        assert_eq!(service.repo.count(&UserKind::new(1, 2)).await.unwrap(), 1);
        assert_eq!(blob_count(&temp), 1);
        assert_eq!(service.get_file(&second.file).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_create_other_kind_keeps_existing() {
        let (temp, service) = service().await;

        let avatar = service.create(1, 2, "avatar.png", b"avatar").await.unwrap();
        service.create(1, 0, "x.png", b"x").await.unwrap();

        let kept = service.first(1, 2).await.unwrap().unwrap();
        assert_eq!(kept.id, avatar.id);
        assert_eq!(service.get_file(&avatar.file).await.unwrap(), b"avatar");
        assert_eq!(blob_count(&temp), 2);

        assert!(service.delete(1, 0).await.unwrap());
        assert!(service.first(1, 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let (temp, service) = service().await;
        service.create(1, 2, "a.png", b"data").await.unwrap();
        service.create(1, 3, "b.png", b"data").await.unwrap();

        assert!(service.delete(1, 2).await.unwrap());
        assert!(!service.delete(1, 2).await.unwrap());
        assert!(service.first(1, 2).await.unwrap().is_none());
        assert!(service.first(1, 3).await.unwrap().is_some());
        assert_eq!(blob_count(&temp), 1);
    }
}
