pub mod admin;
pub mod auth;
pub mod files;
pub mod health;
pub mod upload;

pub use auth::{AuthAdmin, require_admin};

use crate::{
    config::Config,
    database::Database,
    error::AppResult,
    services::{AdminService, MultiFileService, SingleFileService},
    session::SessionStorage,
    storage::Storage,
};
use std::sync::Arc;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Database,
    pub storage: Arc<dyn Storage>,
    pub admin: AdminService,
    pub single_files: SingleFileService,
    pub multi_files: MultiFileService,
}

impl AppState {
    /// 组装服务、建表并创建初始管理员
    pub async fn new(
        config: Config,
        database: Database,
        session: Arc<dyn SessionStorage>,
        storage: Arc<dyn Storage>,
    ) -> AppResult<Self> {
        let admin = AdminService::new(database.clone(), session, &config.session)?;
        let single_files = SingleFileService::new(database.clone(), storage.clone());
        let multi_files = MultiFileService::new(database.clone(), storage.clone());

        admin.migrate().await?;
        single_files.migrate().await?;
        multi_files.migrate().await?;
        tracing::info!("数据表迁移完成");

        admin.ensure_bootstrap_admin(&config.admin).await?;

        Ok(Self {
            config: Arc::new(config),
            database,
            storage,
            admin,
            single_files,
            multi_files,
        })
    }
}
