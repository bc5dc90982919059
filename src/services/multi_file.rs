use crate::{
    database::Database,
    error::AppResult,
    models::{Kind, List, MultiFile, UserKind},
    repositories::MultiFileRepository,
    storage::{ServeUrlGetter, Storage, random_file_name},
};
use std::sync::Arc;

/// 多文件管理：同一用户的同种分类可保存多个文件
#[derive(Clone)]
pub struct MultiFileService {
    repo: MultiFileRepository,
    storage: Arc<dyn Storage>,
}

impl MultiFileService {
    pub fn new(db: Database, storage: Arc<dyn Storage>) -> Self {
        Self {
            repo: MultiFileRepository::new(db),
            storage,
        }
    }

    pub async fn migrate(&self) -> AppResult<()> {
        self.repo.migrate().await
    }

    /// 保存文件
    pub async fn create(
        &self,
        user_id: i64,
        kind: Kind,
        original_name: &str,
        data: &[u8],
    ) -> AppResult<MultiFile> {
        let name = random_file_name(original_name);
        let mut tx = self.repo.database().pool().begin().await?;
        let id = self.repo.insert(&mut tx, user_id, kind, &name).await?;
        self.storage.create_file(&name, data).await?;

        if let Err(e) = tx.commit().await {
            if let Err(cleanup) = self.storage.delete_file(&name).await {
                tracing::warn!("回滚时删除文件失败: {}: {}", name, cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(
            "文件已保存: user={} kind={} file={} ({} 字节)",
            user_id,
            kind,
            name,
            data.len()
        );

        Ok(MultiFile {
            id,
            user_id,
            kind,
            url: self.storage.serve_url(&name)?,
            file: name,
        })
    }

    pub async fn count(&self, user_kind: &UserKind) -> AppResult<i64> {
        self.repo.count(user_kind).await
    }

    /// 分页查询并填充服务地址
    pub async fn find(&self, list: &List) -> AppResult<Vec<MultiFile>> {
        let mut files = self.repo.find(list).await?;
        for file in &mut files {
            file.url = self.storage.serve_url(&file.file)?;
        }
        Ok(files)
    }

    /// 删除指定文件，返回删除后剩余数量
    ///
    /// 记录在事务中删除，提交后逐个删除文件；文件删除失败只记录日志。
    pub async fn delete(&self, user_kind: &UserKind, ids: &[i64]) -> AppResult<i64> {
        if !ids.is_empty() {
            let mut tx = self.repo.database().pool().begin().await?;
            let files = self.repo.find_by_ids(&mut tx, user_kind, ids).await?;
            let deleted = self.repo.delete_by_ids(&mut tx, user_kind, ids).await?;
            tx.commit().await?;

            for file in &files {
                if let Err(e) = self.storage.delete_file(&file.file).await {
                    tracing::warn!("删除文件失败: {}: {}", file.file, e);
                }
            }
            tracing::info!("已删除 {} 个文件记录", deleted);
        }

        self.repo.count(user_kind).await
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::{OrmConfig, tests::memory_database},
        models::{OrderBy, Pagination},
        storage::FileStorage,
    };
    use tempfile::TempDir;

    async fn service() -> (TempDir, MultiFileService) {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path(), "/files").await.unwrap();
        let service = MultiFileService::new(
            memory_database(OrmConfig::default()).await,
            Arc::new(storage),
        );
        service.migrate().await.unwrap();
        (temp, service)
    }

    #[tokio::test]
    async fn test_delete_returns_remaining_count() {
        let (temp, service) = service().await;
        let mut ids = Vec::new();
        for i in 0..4 {
            let file = service
                .create(1, 9, &format!("{}.txt", i), b"data")
                .await
                .unwrap();
            ids.push(file.id);
        }
        let foreign = service.create(2, 9, "x.txt", b"data").await.unwrap();

        let user_kind = UserKind::new(1, 9);
        let remaining = service
            .delete(&user_kind, &[ids[0], ids[2], foreign.id])
            .await
            .unwrap();
        assert_eq!(remaining, 2);
        assert_eq!(service.count(&UserKind::new(2, 9)).await.unwrap(), 1);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 3);

        assert_eq!(service.delete(&user_kind, &[]).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_find_fills_urls() {
        let (_temp, service) = service().await;
        service.create(1, 1, "a.png", b"a").await.unwrap();
        service.create(1, 1, "b.png", b"b").await.unwrap();

        service.set_serve_url_getter(Arc::new(|n: &str| Ok(format!("https://cdn/{}", n))));
        let files = service
            .find(&List {
                user_kind: UserKind::new(1, 1),
                order_by: OrderBy {
                    order_by: "id".to_string(),
                    descending: false,
                },
                pagination: Pagination::default(),
            })
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].id < files[1].id);
        assert!(files.iter().all(|f| f.url == format!("https://cdn/{}", f.file)));
    }
}
