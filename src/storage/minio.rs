use super::{ServeUrlGetter, Storage, UrlResolver};
use crate::{
    config::MinioConfig,
    error::{AppError, AppResult},
};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use std::sync::Arc;

/// MinIO 存储实现，所有文件存放在同一个 bucket 中
#[derive(Debug)]
pub struct MinioStorage {
    client: Arc<Client>,
    config: MinioConfig,
    resolver: UrlResolver,
}

impl MinioStorage {
    /// 创建 MinIO 存储实例并确保 bucket 存在
    pub async fn new(config: MinioConfig) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "minio",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .region(Region::new("us-east-1")) // MinIO默认区域
            .force_path_style(true)
            .behavior_version(BehaviorVersion::latest())
            .build();

        let storage = Self {
            client: Arc::new(Client::from_conf(s3_config)),
            config,
            resolver: UrlResolver::new(),
        };
        storage.ensure_bucket().await?;

        Ok(storage)
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn ensure_bucket(&self) -> AppResult<()> {
        let bucket = self.bucket();
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            tracing::debug!("Bucket '{}' 已存在", bucket);
            return Ok(());
        }

        tracing::info!("Bucket '{}' 不存在，正在创建", bucket);
        let create_bucket_config = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::UsEast2)
            .build();
        self.client
            .create_bucket()
            .bucket(bucket)
            .create_bucket_configuration(create_bucket_config)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("创建bucket失败: {}", e)))?;

        tracing::info!("成功创建bucket: {}", bucket);
        Ok(())
    }

    fn default_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket,
            name
        )
    }
}

#[async_trait::async_trait]
impl Storage for MinioStorage {
    async fn create_file(&self, name: &str, data: &[u8]) -> AppResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(self.bucket())
            .key(name)
            .body(ByteStream::from(data.to_vec()));

        if let Some(kind) = infer::get(data) {
            request = request.content_type(kind.mime_type());
        }

        request
            .send()
            .await
            .map_err(|e| AppError::storage(format!("上传文件失败: {}", e)))?;

        tracing::info!("成功上传文件到MinIO: {}/{}", self.bucket(), name);
        Ok(())
    }

    async fn delete_file(&self, name: &str) -> AppResult<()> {
        // S3 删除不存在的对象同样返回成功
        self.client
            .delete_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|e| AppError::storage(format!("删除文件失败: {}", e)))?;

        tracing::info!("成功删除文件: {}/{}", self.bucket(), name);
        Ok(())
    }

    async fn get_file(&self, name: &str) -> AppResult<Vec<u8>> {
        let result = match self
            .client
            .get_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
        {
            Ok(result) => result,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(AppError::file_not_found(name));
                }
                return Err(AppError::storage(format!("下载文件失败: {}", service_err)));
            }
        };

        let data = result
            .body
            .collect()
            .await
            .map_err(|e| AppError::storage(format!("读取文件数据失败: {}", e)))?;

        Ok(data.to_vec())
    }

    fn serve_url(&self, name: &str) -> AppResult<String> {
        self.resolver.resolve(name, |n| self.default_url(n))
    }

    fn set_serve_url_getter(&self, getter: ServeUrlGetter) {
        self.resolver.set(getter);
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self.client.head_bucket().bucket(self.bucket()).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::error!("MinIO健康检查失败: {}", e);
                Ok(false)
            }
        }
    }
}
