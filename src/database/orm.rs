use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// ORM 配置（`[orm]`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrmConfig {
    /// 日志等级 1-Silent, 2-Error, 3-Warn, 4-Info
    pub log_level: i64,
    /// 数据库表名前缀
    pub table_prefix: String,
    /// 使用单数表名
    pub singular_table: bool,
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            log_level: 2,
            table_prefix: String::new(),
            singular_table: false,
        }
    }
}

impl OrmConfig {
    /// SQL 语句日志等级
    pub fn statement_level(&self) -> LevelFilter {
        match self.log_level {
            i64::MIN..=1 => LevelFilter::Off,
            2 => LevelFilter::Error,
            3 => LevelFilter::Warn,
            _ => LevelFilter::Info,
        }
    }

    pub fn naming_strategy(&self) -> NamingStrategy {
        NamingStrategy {
            table_prefix: self.table_prefix.clone(),
            singular_table: self.singular_table,
        }
    }
}

/// 表名命名策略
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingStrategy {
    pub table_prefix: String,
    pub singular_table: bool,
}

impl NamingStrategy {
    /// `name` 为单数蛇形名称，如 `single_file`
    pub fn table_name(&self, name: &str) -> String {
        if self.singular_table {
            format!("{}{}", self.table_prefix, name)
        } else {
            format!("{}{}", self.table_prefix, pluralize(name))
        }
    }
}

fn pluralize(name: &str) -> String {
    if name.ends_with('s') || name.ends_with('x') || name.ends_with("ch") || name.ends_with("sh")
    {
        format!("{}es", name)
    } else if let Some(stem) = name.strip_suffix('y').filter(|s| !s.ends_with(['a', 'e', 'i', 'o', 'u'])) {
        format!("{}ies", stem)
    } else {
        format!("{}s", name)
    }
}
