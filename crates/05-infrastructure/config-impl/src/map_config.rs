//! 不可变配置层实现

use crate::interpolator::StringInterpolator;
use crate::owners::OwnerLinks;
use config_abstractions::{Config, ConfigListener, ListenerId, RawConfigContent, RawValue};
use infrastructure_common::ConfigError;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// 不可变配置层
///
/// 加载器为每个获取到的候选资源生成一个该类型的配置层。
/// 内容不会变化，因此注册的监听器不会被调用。
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    properties: BTreeMap<String, RawValue>,
    interpolator: StringInterpolator,
    owners: OwnerLinks,
}

impl MapConfig {
    /// 从原始内容创建配置层
    pub fn new(properties: RawConfigContent) -> Self {
        Self {
            properties,
            interpolator: StringInterpolator::new(),
            owners: OwnerLinks::new(),
        }
    }

    /// 创建构建器
    pub fn builder() -> MapConfigBuilder {
        MapConfigBuilder::default()
    }

    /// 设置占位符解析器
    pub fn with_interpolator(mut self, interpolator: StringInterpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// 配置项数量
    pub fn len(&self) -> usize {
        self.properties.len()
    }
}

impl From<RawConfigContent> for MapConfig {
    fn from(properties: RawConfigContent) -> Self {
        Self::new(properties)
    }
}

impl Config for MapConfig {
    fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn get_raw_property(&self, key: &str) -> Option<RawValue> {
        self.properties.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    fn resolve_placeholders(&self, template: &str) -> Result<String, ConfigError> {
        self.owners.resolve(template, |template| {
            self.interpolator
                .resolve(template, &|key: &str| self.lookup(key))
        })
    }

    fn attach_owner(&self, owner: Weak<dyn Config>) {
        self.owners.attach(owner);
    }

    fn detach_owner(&self, owner: &Weak<dyn Config>) {
        self.owners.detach(owner);
    }

    fn add_listener(&self, _listener: Arc<dyn ConfigListener>) -> ListenerId {
        ListenerId::new()
    }

    fn remove_listener(&self, _id: ListenerId) -> bool {
        false
    }
}

/// [`MapConfig`] 构建器
#[derive(Debug, Default)]
pub struct MapConfigBuilder {
    properties: BTreeMap<String, RawValue>,
    interpolator: StringInterpolator,
}

impl MapConfigBuilder {
    /// 添加配置项
    pub fn put(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 设置占位符解析器
    pub fn interpolator(mut self, interpolator: StringInterpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// 构建配置层
    pub fn build(self) -> MapConfig {
        MapConfig {
            properties: self.properties,
            interpolator: self.interpolator,
            owners: OwnerLinks::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_abstractions::ConfigExt;

    fn sample() -> MapConfig {
        MapConfig::builder()
            .put("host", "localhost")
            .put("port", 8080)
            .put("url", "http://${host}:${port}")
            .put("enabled", true)
            .put("tags", vec!["a", "b"])
            .put("ports", vec![RawValue::from(1), RawValue::from("2"), RawValue::from(true)])
            .put("csv", "1, 2,3")
            .build()
    }

    #[test]
    fn test_typed_getters() {
        let config = sample();
        assert_eq!(config.get_string("host").unwrap(), "localhost");
        assert_eq!(config.get::<u16>("port").unwrap(), 8080);
        assert!(config.get_bool("enabled").unwrap());
        assert_eq!(config.get_string("url").unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_missing_key_without_default() {
        let config = sample();
        assert!(matches!(
            config.get::<i32>("missing"),
            Err(ConfigError::KeyNotFound { key }) if key == "missing"
        ));
        assert_eq!(config.get_or("missing", 5_i32).unwrap(), 5);
        assert_eq!(config.get_optional::<i32>("missing").unwrap(), None);
    }

    #[test]
    fn test_list_getters() {
        let config = sample();
        assert_eq!(config.get_list::<String>("tags").unwrap(), vec!["a", "b"]);
        assert_eq!(config.get_list::<i32>("csv").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            config.get_list::<i32>("ports"),
            Err(ConfigError::UnsupportedValueType {
                expected: "i32",
                actual: "boolean"
            })
        ));
    }

    #[test]
    fn test_list_elements_are_not_coerced() {
        let config = MapConfig::builder()
            .put("mixed", vec![RawValue::from(1), RawValue::from(true)])
            .put("ratios", vec![RawValue::from(1), RawValue::from(0.5)])
            .put("hosts", vec!["${host}", "backup"])
            .put("host", "primary")
            .build();

        assert!(matches!(
            config.get_list::<String>("mixed"),
            Err(ConfigError::UnsupportedValueType {
                expected: "string",
                actual: "integer"
            })
        ));
        assert!(matches!(
            config.get_list::<f64>("ratios"),
            Err(ConfigError::UnsupportedValueType { actual: "integer", .. })
        ));
        assert_eq!(
            config.get_list::<String>("hosts").unwrap(),
            vec!["primary", "backup"]
        );
    }

    #[test]
    fn test_keys_are_stable_and_restartable() {
        let config = sample();
        let first = config.keys();
        let second = config.keys();
        assert_eq!(first, second);
        assert_eq!(first.len(), config.len());
        assert!(!config.is_empty());
        assert!(MapConfig::default().is_empty());
    }

    #[test]
    fn test_reads_are_idempotent() {
        let config = sample();
        assert_eq!(
            config.get_string("url").unwrap(),
            config.get_string("url").unwrap()
        );
    }
}
