use thiserror::Error;
use toml::Value;

/// 环境变量来源：根据命名空间和键名返回覆盖值
pub trait EnvGetter: Fn(&str, &str) -> Option<String> {}

impl<F> EnvGetter for F where F: Fn(&str, &str) -> Option<String> {}

/// 系统环境变量来源，变量名为 `<namespace>.<key>`，无命名空间时为 `<key>`
pub fn os_env_getter(namespace: &str, key: &str) -> Option<String> {
    std::env::var(env_var_name(namespace, key)).ok()
}

pub fn env_var_name(namespace: &str, key: &str) -> String {
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", namespace, key)
    }
}

/// 加载系统环境变量失败
#[derive(Error, Debug)]
#[error("加载系统环境变量 {} 失败: {reason}", env_var_name(.namespace, .key))]
pub struct LoadOsError {
    pub namespace: String,
    pub key: String,
    pub reason: String,
}

impl LoadOsError {
    fn new(namespace: &str, key: &str, reason: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

const TRUTHY: &[&str] = &["y", "Y", "yes", "YES", "Yes", "1", "t", "T", "true", "TRUE", "True"];
const FALSY: &[&str] = &["n", "N", "no", "NO", "No", "0", "f", "F", "false", "FALSE", "False"];

/// 按原值类型转换环境变量值
pub(super) fn coerce(
    namespace: &str,
    key: &str,
    original: &Value,
    raw: &str,
) -> Result<Value, LoadOsError> {
    match original {
        Value::String(_) => Ok(Value::String(raw.to_string())),
        Value::Integer(_) => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| LoadOsError::new(namespace, key, e)),
        Value::Boolean(_) => parse_bool(raw)
            .map(Value::Boolean)
            .ok_or_else(|| LoadOsError::new(namespace, key, "需要布尔类型参数")),
        Value::Float(_) => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| LoadOsError::new(namespace, key, e)),
        other => Err(LoadOsError::new(
            namespace,
            key,
            format!("不支持 {} 类型的参数", other.type_str()),
        )),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    if TRUTHY.contains(&raw) {
        Some(true)
    } else if FALSY.contains(&raw) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("mysql", "host"), "mysql.host");
        assert_eq!(env_var_name("", "host"), "host");
    }

    #[test]
    fn test_os_env_getter_reads_process_env() {
        let path = std::env::var("PATH").ok();
        assert_eq!(os_env_getter("", "PATH"), path);
        assert_eq!(os_env_getter("panelkit_absent_ns", "absent_key"), None);
    }

    #[test]
    fn test_bool_spellings() {
        for raw in TRUTHY {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in FALSY {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("on"), None);
        assert_eq!(parse_bool("tRuE"), None);
    }

    #[test]
    fn test_coerce_bool_rejects_unknown_spelling() {
        let err = coerce("server", "debug", &Value::Boolean(false), "maybe").unwrap_err();
        assert_eq!(err.to_string(), "加载系统环境变量 server.debug 失败: 需要布尔类型参数");
    }

    #[test]
    fn test_coerce_keeps_type() {
        assert_eq!(
            coerce("", "port", &Value::Integer(1), "42").unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            coerce("", "name", &Value::String("a".into()), "42").unwrap(),
            Value::String("42".into())
        );
    }

    #[test]
    fn test_coerce_unsupported_table() {
        let err = coerce("app", "nested", &Value::Table(Default::default()), "x").unwrap_err();
        assert!(err.reason.contains("table"));
    }
}
