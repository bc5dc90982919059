use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env;
mod loader;

pub use env::{EnvGetter, LoadOsError, env_var_name, os_env_getter};
pub use loader::Configs;

/// 默认配置文件内容，配置文件不存在时写入磁盘
pub const DEFAULT_CONFIG: &str = r#"# 服务器配置
[server]
host = "0.0.0.0"
port = 8080
# 请求体大小上限（字节）
max_body_size = 33554432

# 数据库选择（mysql/postgres/sqlite），连接参数读取同名配置段
[database]
dialect = "mysql"

# mysql 数据库配置
[mysql]
host = "127.0.0.1"
port = 3306
user = "root"
password = "123456"
db_name = "panelkit"
# 连接参数
parameters = "charset=utf8mb4"
# 最长连接复用时间(单位: 秒), 如果该值为 0, 则不限制时间
max_lifetime = 0
# 最多打开数据库的连接数量, 如果该值为 0, 则使用驱动默认值
max_open_conns = 10
# 连接池中保持的空闲连接数量, 如果该值为 0, 则不保留空闲连接
max_idle_conns = 10

# postgres 数据库配置
[postgres]
host = "127.0.0.1"
port = 5432
user = "postgres"
password = "123456"
db_name = "panelkit"
ssl_mode = "disable"
max_lifetime = 0
max_open_conns = 10
max_idle_conns = 10

# sqlite 数据库配置
[sqlite]
url = "sqlite://panelkit.db?mode=rwc"
max_lifetime = 0
max_open_conns = 1
max_idle_conns = 1

# orm 配置
[orm]
# 日志等级 1-Silent, 2-Error, 3-Warn, 4-Info
log_level = 2
# 数据库表名前缀
table_prefix = ""
# 使用单数表名
singular_table = false

# redis 数据库配置
[redis]
addr = "localhost:6379"
password = ""
db = 0

# 会话配置
[session]
# 会话存储（redis/memory）
backend = "redis"
key_prefix = "panelkit:admin:"
# 会话过期时间（秒）
expires_secs = 7200
# 携带令牌的请求头
header = "Authorization"
# 令牌加密密钥（16 或 32 位字符串）
aes_key = "0123456789abcdef"

# 文件存储配置
[storage]
# 存储后端（local/minio）
backend = "local"
dir = "uploads"
# 本地文件服务地址前缀
serve_prefix = "/files"

# MinIO 配置（storage.backend = "minio" 时生效）
[minio]
endpoint = "http://localhost:9000"
access_key = "minioadmin"
secret_key = "minioadmin"
bucket = "panelkit"

# 上传配置
[upload]
# 上传文件在表单中的字段名
post_key = "file"

# 初始管理员（用户名已存在时跳过）
[admin]
username = ""
password = ""
"#;

/// 应用程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub admin: AdminConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 32 * 1024 * 1024,
        }
    }
}

/// 数据库选择
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dialect: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: "mysql".to_string(),
        }
    }
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: String,
    pub key_prefix: String,
    pub expires_secs: u64,
    pub header: String,
    pub aes_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            key_prefix: "panelkit:admin:".to_string(),
            expires_secs: 7200,
            header: "Authorization".to_string(),
            aes_key: "0123456789abcdef".to_string(),
        }
    }
}

/// 文件存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: String,
    pub dir: String,
    pub serve_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            dir: "uploads".to_string(),
            serve_prefix: "/files".to_string(),
        }
    }
}

/// MinIO配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
}

impl Default for MinioConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: "panelkit".to_string(),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub post_key: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            post_key: "file".to_string(),
        }
    }
}

/// 初始管理员配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl AdminConfig {
    pub fn is_set(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl Config {
    /// 从配置文档读取各配置段（环境变量覆盖同名键）
    pub fn from_configs(configs: &Configs) -> AppResult<Self> {
        let config = Self {
            server: configs.unmarshal_sub("server")?,
            database: configs.unmarshal_sub("database")?,
            session: configs.unmarshal_sub("session")?,
            storage: configs.unmarshal_sub("storage")?,
            upload: configs.unmarshal_sub("upload")?,
            admin: configs.unmarshal_sub("admin")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<(Self, Configs)> {
        let configs = Configs::unmarshal_file(path)?;
        let config = Self::from_configs(&configs)?;
        Ok((config, configs))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> AppResult<()> {
        if self.server.port == 0 {
            return Err(AppError::config("服务器端口不能为0"));
        }

        if self.server.max_body_size == 0 {
            return Err(AppError::config("请求体大小上限不能为0"));
        }

        if !matches!(self.database.dialect.as_str(), "mysql" | "postgres" | "sqlite") {
            return Err(AppError::config(format!(
                "不支持的数据库类型: {}",
                self.database.dialect
            )));
        }

        if !matches!(self.session.backend.as_str(), "redis" | "memory") {
            return Err(AppError::config(format!(
                "不支持的会话存储: {}",
                self.session.backend
            )));
        }

        if self.session.header.is_empty() {
            return Err(AppError::config("令牌请求头名称不能为空"));
        }

        if self.session.expires_secs == 0 {
            return Err(AppError::config("会话过期时间不能为0"));
        }

        if !matches!(self.session.aes_key.len(), 16 | 32) {
            return Err(AppError::config("令牌加密密钥长度必须为16或32"));
        }

        if !matches!(self.storage.backend.as_str(), "local" | "minio") {
            return Err(AppError::config(format!(
                "不支持的存储后端: {}",
                self.storage.backend
            )));
        }

        if self.storage.backend == "local" && self.storage.dir.is_empty() {
            return Err(AppError::config("本地存储目录不能为空"));
        }

        if self.upload.post_key.is_empty() {
            return Err(AppError::config("上传字段名不能为空"));
        }

        Ok(())
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 写入默认配置文件
    pub fn save_default<P: AsRef<Path>>(path: P) -> AppResult<()> {
        std::fs::write(path.as_ref(), DEFAULT_CONFIG)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.expires_secs, 7200);
        assert_eq!(config.upload.post_key, "file");
        assert!(!config.admin.is_set());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.aes_key = "short".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.dialect = "oracle".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_default_template_parses() {
        let configs = Configs::unmarshal_memory(DEFAULT_CONFIG).unwrap();
        let config = Config::from_configs(&configs).unwrap();

        assert_eq!(config.database.dialect, "mysql");
        assert_eq!(config.session.header, "Authorization");
        assert_eq!(config.storage.serve_prefix, "/files");
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let configs = Configs::unmarshal_memory("[server]\nport = 9000\n").unwrap();
        let config = Config::from_configs(&configs).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.backend, "redis");
    }

    #[test]
    fn test_save_and_load_default() {
        let temp_file = NamedTempFile::new().unwrap();
        Config::save_default(temp_file.path()).unwrap();

        let (config, configs) = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(configs.contains_key("mysql"));
    }
}
