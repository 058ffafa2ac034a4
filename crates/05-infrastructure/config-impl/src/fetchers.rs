//! 资源获取器实现
//!
//! 加载器通过 [`ResourceFetcher`] 获取候选资源的内容。
//! 这里提供内存与文件两种实现，文件实现支持 TOML 与 JSON，
//! 嵌套表会被展开为以 `.` 连接的键。

use config_abstractions::{RawConfigContent, RawValue, ResourceFetcher};
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 内存资源获取器
#[derive(Debug, Default)]
pub struct InMemoryResourceFetcher {
    resources: RwLock<HashMap<String, RawConfigContent>>,
}

impl InMemoryResourceFetcher {
    /// 创建空的内存资源获取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册资源内容
    pub fn with_resource<K, V>(self, name: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
    {
        self.insert(name, entries);
        self
    }

    /// 注册或覆盖资源内容
    pub fn insert<K, V>(&self, name: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<RawValue>,
    {
        let content = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.resources.write().insert(name.into(), content);
    }

    /// 移除资源
    pub fn remove(&self, name: &str) -> bool {
        self.resources.write().remove(name).is_some()
    }
}

impl ResourceFetcher for InMemoryResourceFetcher {
    fn fetch(&self, resource_name: &str) -> Result<Option<RawConfigContent>, ConfigError> {
        Ok(self.resources.read().get(resource_name).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// 支持的配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML 文件
    Toml,
    /// JSON 文件
    Json,
}

impl FileFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// 文件资源获取器
///
/// 在根目录下按 `<资源名>.<扩展名>` 查找文件，依次尝试配置的格式。
#[derive(Debug, Clone)]
pub struct FileResourceFetcher {
    root: PathBuf,
    formats: Vec<FileFormat>,
}

impl FileResourceFetcher {
    /// 创建文件资源获取器，默认依次尝试 TOML 与 JSON
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            formats: vec![FileFormat::Toml, FileFormat::Json],
        }
    }

    /// 设置尝试的文件格式及顺序
    pub fn with_formats(mut self, formats: Vec<FileFormat>) -> Self {
        self.formats = formats;
        self
    }

    /// 根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parse(&self, path: &Path, format: FileFormat) -> Result<RawConfigContent, ConfigError> {
        debug!("加载配置文件: {}", path.display());
        let content = std::fs::read_to_string(path)?;

        let mut properties = RawConfigContent::new();
        match format {
            FileFormat::Toml => {
                let table: toml::Table = toml::from_str(&content).map_err(|e| {
                    ConfigError::ParseError {
                        source: Box::new(e),
                    }
                })?;
                for (key, value) in &table {
                    collect_toml(key, value, &mut properties);
                }
            }
            FileFormat::Json => {
                let value: serde_json::Value = serde_json::from_str(&content)?;
                match value {
                    serde_json::Value::Object(map) => {
                        for (key, value) in &map {
                            collect_json(key, value, &mut properties);
                        }
                    }
                    _ => {
                        return Err(ConfigError::conversion(format!(
                            "JSON 配置文件的根必须是对象: {}",
                            path.display()
                        )))
                    }
                }
            }
        }

        debug!("配置文件加载完成: {} ({} 项)", path.display(), properties.len());
        Ok(properties)
    }
}

impl ResourceFetcher for FileResourceFetcher {
    fn fetch(&self, resource_name: &str) -> Result<Option<RawConfigContent>, ConfigError> {
        for format in &self.formats {
            let path = self
                .root
                .join(format!("{}.{}", resource_name, format.extension()));
            if path.is_file() {
                return self.parse(&path, *format).map(Some);
            }
        }
        debug!("未找到配置文件: {} ({})", resource_name, self.root.display());
        Ok(None)
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// 将 TOML 值转换为原始值，表返回 `None`
fn toml_to_raw(value: &toml::Value) -> Option<RawValue> {
    match value {
        toml::Value::String(s) => Some(RawValue::String(s.clone())),
        toml::Value::Integer(i) => Some(RawValue::Integer(*i)),
        toml::Value::Float(f) => Some(RawValue::Float(*f)),
        toml::Value::Boolean(b) => Some(RawValue::Boolean(*b)),
        toml::Value::Datetime(dt) => Some(RawValue::String(dt.to_string())),
        toml::Value::Array(items) => Some(RawValue::List(
            items.iter().filter_map(toml_to_raw).collect(),
        )),
        toml::Value::Table(_) => None,
    }
}

/// 递归展开 TOML 表
fn collect_toml(prefix: &str, value: &toml::Value, properties: &mut RawConfigContent) {
    match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                collect_toml(&format!("{}.{}", prefix, key), nested, properties);
            }
        }
        other => {
            if let Some(raw) = toml_to_raw(other) {
                properties.insert(prefix.to_string(), raw);
            }
        }
    }
}

/// 递归展开 JSON 对象
fn collect_json(prefix: &str, value: &serde_json::Value, properties: &mut RawConfigContent) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                collect_json(&format!("{}.{}", prefix, key), nested, properties);
            }
        }
        other => match RawValue::from_json(other) {
            Some(raw) => {
                properties.insert(prefix.to_string(), raw);
            }
            None => warn!("忽略无法表示的配置值: {}", prefix),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_fetch() {
        let fetcher = InMemoryResourceFetcher::new().with_resource("app", [("port", 8080)]);
        let content = fetcher.fetch("app").unwrap().unwrap();
        assert_eq!(content.get("port"), Some(&RawValue::Integer(8080)));
        assert!(fetcher.fetch("missing").unwrap().is_none());

        assert!(fetcher.remove("app"));
        assert!(fetcher.fetch("app").unwrap().is_none());
    }

    #[test]
    fn test_toml_tables_are_flattened() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.toml"),
            r#"
name = "adsp"

[server]
port = 8080
hosts = ["a", "b"]

[server.tls]
enabled = true
"#,
        )
        .unwrap();

        let fetcher = FileResourceFetcher::new(dir.path());
        let content = fetcher.fetch("app").unwrap().unwrap();
        assert_eq!(content.get("name"), Some(&RawValue::from("adsp")));
        assert_eq!(content.get("server.port"), Some(&RawValue::Integer(8080)));
        assert_eq!(content.get("server.tls.enabled"), Some(&RawValue::Boolean(true)));
        assert_eq!(
            content.get("server.hosts"),
            Some(&RawValue::from(vec!["a", "b"]))
        );
    }

    #[test]
    fn test_json_and_missing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app-dev.json"),
            r#"{"server": {"port": 9090}, "debug": true}"#,
        )
        .unwrap();

        let fetcher = FileResourceFetcher::new(dir.path());
        let content = fetcher.fetch("app-dev").unwrap().unwrap();
        assert_eq!(content.get("server.port"), Some(&RawValue::Integer(9090)));
        assert_eq!(content.get("debug"), Some(&RawValue::Boolean(true)));
        assert!(fetcher.fetch("app-prod").unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.toml"), "name = ").unwrap();
        let fetcher = FileResourceFetcher::new(dir.path());
        assert!(matches!(
            fetcher.fetch("broken"),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
