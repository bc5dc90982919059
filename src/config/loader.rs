use super::env::{EnvGetter, LoadOsError, os_env_getter};
use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use std::path::Path;
use toml::{Table, Value};

/// 配置文档
///
/// 以命名空间（顶层 section）组织的键值数据，读取子配置时会用系统环境变量覆盖同名键。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configs(Table);

impl Configs {
    /// 从内存数据解析配置
    pub fn unmarshal_memory<D: AsRef<[u8]>>(data: D) -> AppResult<Self> {
        let content = std::str::from_utf8(data.as_ref())
            .map_err(|e| AppError::config(format!("配置内容不是有效的UTF-8: {}", e)))?;
        let table: Table = toml::from_str(content)
            .map_err(|e| AppError::config(format!("解析配置文件失败: {}", e)))?;
        Ok(Self(table))
    }

    /// 从配置文件解析配置
    pub fn unmarshal_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::unmarshal_memory(data)
    }

    /// 将配置解码到目标结构
    pub fn unmarshal<T: DeserializeOwned>(&self) -> AppResult<T> {
        Value::Table(self.0.clone())
            .try_into()
            .map_err(|e| AppError::config(format!("解码配置失败: {}", e)))
    }

    /// `get_sub` 与 `unmarshal` 的组合
    pub fn unmarshal_sub<T: DeserializeOwned>(&self, namespace: &str) -> AppResult<T> {
        self.get_sub(namespace)?.unmarshal()
    }

    /// 同 `unmarshal_sub`，但使用指定的环境变量来源
    pub fn unmarshal_sub_with<T, G>(&self, namespace: &str, getter: G) -> AppResult<T>
    where
        T: DeserializeOwned,
        G: EnvGetter,
    {
        self.get_sub_with(namespace, getter)?.unmarshal()
    }

    /// 获取子配置并加载系统环境变量
    ///
    /// 命名空间不存在时返回空配置；命名空间对应的值不是表时返回错误。
    pub fn get_sub(&self, namespace: &str) -> AppResult<Configs> {
        self.get_sub_with(namespace, os_env_getter)
    }

    /// 获取子配置并从指定来源加载环境变量
    pub fn get_sub_with<G: EnvGetter>(&self, namespace: &str, getter: G) -> AppResult<Configs> {
        match self.0.get(namespace) {
            None => Ok(Configs::default()),
            Some(Value::Table(table)) => {
                let mut sub = Configs(table.clone());
                sub.load_os_env_with(namespace, getter)?;
                Ok(sub)
            }
            Some(other) => Err(AppError::config(format!(
                "配置 {} 需要对象数据，实际为: {}",
                namespace,
                other.type_str()
            ))),
        }
    }

    /// 使用系统环境变量覆盖当前配置中已有的键
    pub fn load_os_env(&mut self, namespace: &str) -> Result<(), LoadOsError> {
        self.load_os_env_with(namespace, os_env_getter)
    }

    /// 使用指定的环境变量来源覆盖当前配置中已有的键
    ///
    /// 覆盖值按原值类型转换（字符串/整数/布尔/浮点），其他类型报错。
    pub fn load_os_env_with<G: EnvGetter>(
        &mut self,
        namespace: &str,
        getter: G,
    ) -> Result<(), LoadOsError> {
        for (key, value) in self.0.iter_mut() {
            let Some(raw) = getter(namespace, key).filter(|v| !v.is_empty()) else {
                continue;
            };
            *value = super::env::coerce(namespace, key, value, &raw)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_integer)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    pub fn get_slice_str(&self, name: &str) -> Option<Vec<String>> {
        self.get_slice(name, |v| v.as_str().map(str::to_string))
    }

    pub fn get_slice_int(&self, name: &str) -> Option<Vec<i64>> {
        self.get_slice(name, Value::as_integer)
    }

    pub fn get_slice_float(&self, name: &str) -> Option<Vec<f64>> {
        self.get_slice(name, Value::as_float)
    }

    pub fn get_slice_bool(&self, name: &str) -> Option<Vec<bool>> {
        self.get_slice(name, Value::as_bool)
    }

    // 数组中任一元素类型不符时返回 None
    fn get_slice<T>(&self, name: &str, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(&item).collect())
    }
}

impl From<Table> for Configs {
    fn from(table: Table) -> Self {
        Self(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct MysqlSection {
        host: String,
        port: String,
    }

    const DATA: &str = r#"
plain = "value"

[mysql]
host = "127.0.0.1"
port = "3306"

[server]
port = 8080
debug = false
ratio = 0.5
tags = ["a", "b"]
"#;

    fn fake_env(pairs: &[(&str, &str)]) -> impl Fn(&str, &str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |namespace: &str, key: &str| {
            let name = if namespace.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", namespace, key)
            };
            vars.get(&name).cloned()
        }
    }

    #[test]
    fn test_env_overrides_file_value() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let mysql: MysqlSection = configs
            .unmarshal_sub_with("mysql", fake_env(&[("mysql.host", "localhost")]))
            .unwrap();

        assert_eq!(format!("{}:{}", mysql.host, mysql.port), "localhost:3306");
    }

    #[test]
    fn test_env_override_through_unmarshal_sub_with() {
        let data = r#"
[cache]
host = "127.0.0.1"
port = "6379"
"#;
        let configs = Configs::unmarshal_memory(data).unwrap();
        let cache: MysqlSection = configs
            .unmarshal_sub_with("cache", fake_env(&[("cache.host", "localhost")]))
            .unwrap();
        assert_eq!(cache.host, "localhost");
        assert_eq!(cache.port, "6379");
    }

    #[test]
    fn test_env_coerces_to_original_type() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let server = configs
            .get_sub_with(
                "server",
                fake_env(&[
                    ("server.port", "9090"),
                    ("server.debug", "Yes"),
                    ("server.ratio", "0.75"),
                ]),
            )
            .unwrap();

        assert_eq!(server.get_int("port"), Some(9090));
        assert_eq!(server.get_bool("debug"), Some(true));
        assert_eq!(server.get_float("ratio"), Some(0.75));
    }

    #[test]
    fn test_env_bad_integer_fails() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let err = configs
            .get_sub_with("server", fake_env(&[("server.port", "eighty")]))
            .unwrap_err();

        match err {
            AppError::LoadEnv(e) => {
                assert_eq!(e.namespace, "server");
                assert_eq!(e.key, "port");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_env_unsupported_type_fails() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let err = configs
            .get_sub_with("server", fake_env(&[("server.tags", "c")]))
            .unwrap_err();

        assert!(err.to_string().contains("server.tags"));
    }

    #[test]
    fn test_env_without_namespace_uses_bare_key() {
        let mut configs = Configs::unmarshal_memory("name = \"file\"\n").unwrap();
        configs
            .load_os_env_with("", fake_env(&[("name", "env")]))
            .unwrap();
        assert_eq!(configs.get_str("name"), Some("env"));
    }

    #[test]
    fn test_env_only_touches_existing_keys() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let mysql = configs
            .get_sub_with("mysql", fake_env(&[("mysql.user", "root")]))
            .unwrap();
        assert!(!mysql.contains_key("user"));
        assert_eq!(mysql.len(), 2);
    }

    #[test]
    fn test_missing_namespace_is_empty() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let redis = configs.get_sub("redis").unwrap();
        assert!(redis.is_empty());
    }

    #[test]
    fn test_non_table_namespace_fails() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        assert!(configs.get_sub("plain").is_err());
    }

    #[test]
    fn test_typed_getters() {
        let configs = Configs::unmarshal_memory(DATA).unwrap();
        let server = configs.get_sub_with("server", fake_env(&[])).unwrap();

        assert_eq!(
            server.get_slice_str("tags"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(server.get_slice_int("tags"), None);
        assert_eq!(server.get_str("port"), None);
        assert_eq!(configs.get_str("plain"), Some("value"));
    }

    #[test]
    fn test_unmarshal_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), DATA).unwrap();

        let configs = Configs::unmarshal_file(temp_file.path()).unwrap();
        assert!(configs.contains_key("mysql"));
        assert!(configs.contains_key("server"));
    }

    #[test]
    fn test_invalid_document_fails() {
        let err = Configs::unmarshal_memory("[mysql\nhost=").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
