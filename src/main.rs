/*
 * PanelKit - Admin Panel Backend Toolkit
 * Copyright (c) 2024 PanelKit Project
 *
 * This work is licensed under CC BY-NC-SA 4.0
 * https://creativecommons.org/licenses/by-nc-sa/4.0/
 */

use panelkit_backend::{
    cache::RedisConfig,
    config::{Config, MinioConfig},
    database::Database,
    error::AppResult,
    handlers::AppState,
    routes::create_app,
    session::{MemoryStorage, RedisStorage, SessionStorage},
    storage::{FileStorage, MinioStorage, Storage},
};
use std::{path::Path, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 配置文件路径环境变量
const CONFIG_PATH_ENV: &str = "PANELKIT_CONFIG";

#[tokio::main]
async fn main() -> AppResult<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "panelkit_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，文件不存在时写入默认配置
    let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&config_path).exists() {
        tracing::warn!("未找到配置文件，写入默认配置: {}", config_path);
        Config::save_default(&config_path)?;
    }
    let (config, configs) = Config::from_file(&config_path)?;
    tracing::info!("已加载配置文件: {}", config_path);
    tracing::info!("服务器配置: {}", config.server_addr());

    // 初始化数据库
    let database = Database::from_configs(&configs).await?;
    if let Err(e) = database.verify_connection().await {
        tracing::warn!("数据库验证失败: {}", e);
    }

    // 初始化会话存储
    let session: Arc<dyn SessionStorage> = match config.session.backend.as_str() {
        "memory" => {
            tracing::warn!("使用进程内会话存储，重启后所有令牌失效");
            Arc::new(MemoryStorage::new(config.session.key_prefix.clone()))
        }
        _ => {
            let conn = RedisConfig::new_client("redis", &configs).await?;
            Arc::new(RedisStorage::new(config.session.key_prefix.clone(), conn))
        }
    };

    // 初始化文件存储
    let storage: Arc<dyn Storage> = match config.storage.backend.as_str() {
        "minio" => {
            let minio: MinioConfig = configs.unmarshal_sub("minio")?;
            Arc::new(MinioStorage::new(minio).await?)
        }
        _ => Arc::new(FileStorage::from_config(&config.storage).await?),
    };

    let state = AppState::new(config.clone(), database.clone(), session, storage).await?;
    let app = create_app(state);

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("🚀 服务器启动成功，监听地址: {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
    }
    tracing::info!("收到退出信号，正在关闭服务...");
}
