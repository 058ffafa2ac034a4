//! 环境变量配置层实现

use crate::interpolator::StringInterpolator;
use crate::listeners::ListenerRegistry;
use crate::owners::OwnerLinks;
use config_abstractions::{Config, ConfigChangeEvent, ConfigListener, ListenerId, RawValue};
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 环境变量配置层
///
/// 创建时对环境变量做快照，`reload` 重新扫描并通知监听器。
/// 设置前缀时只收集带前缀的变量，并将 `APP_SERVER_PORT` 映射为 `server.port`。
pub struct EnvironmentConfig {
    prefix: Option<String>,
    separator: String,
    env_vars: RwLock<BTreeMap<String, RawValue>>,
    listeners: ListenerRegistry<dyn ConfigListener>,
    interpolator: StringInterpolator,
    owners: OwnerLinks,
}

impl std::fmt::Debug for EnvironmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentConfig")
            .field("prefix", &self.prefix)
            .field("separator", &self.separator)
            .field("env_vars_count", &self.env_vars.read().len())
            .finish()
    }
}

impl EnvironmentConfig {
    /// 创建收集全部环境变量的配置层，键保持原样
    pub fn new() -> Self {
        Self::build(None)
    }

    /// 创建只收集指定前缀环境变量的配置层
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::build(Some(prefix.into()))
    }

    fn build(prefix: Option<String>) -> Self {
        let config = Self {
            prefix,
            separator: "_".to_string(),
            env_vars: RwLock::new(BTreeMap::new()),
            listeners: ListenerRegistry::new(),
            interpolator: StringInterpolator::new(),
            owners: OwnerLinks::new(),
        };
        *config.env_vars.write() = config.scan();
        config
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        let scanned = self.scan();
        *self.env_vars.write() = scanned;
        self
    }

    /// 重新扫描环境变量并通知监听器
    pub fn reload(&self) {
        let scanned = self.scan();
        let changed = {
            let mut guard = self.env_vars.write();
            let changed = *guard != scanned;
            *guard = scanned;
            changed
        };
        if changed {
            debug!("环境变量配置已重载");
            let event = ConfigChangeEvent::reloaded("environment");
            self.listeners
                .for_each(|listener| listener.on_config_changed(&event));
        }
    }

    fn scan(&self) -> BTreeMap<String, RawValue> {
        let mut vars = BTreeMap::new();
        for (key, value) in std::env::vars() {
            match &self.prefix {
                Some(prefix) if key.starts_with(prefix.as_str()) => {
                    vars.insert(self.env_key_to_config_key(&key, prefix), RawValue::String(value));
                }
                Some(_) => {}
                None => {
                    vars.insert(key, RawValue::String(value));
                }
            }
        }
        debug!("加载了 {} 个环境变量", vars.len());
        vars
    }

    /// 将环境变量键转换为配置键
    fn env_key_to_config_key(&self, env_key: &str, prefix: &str) -> String {
        let key = env_key
            .strip_prefix(prefix)
            .unwrap_or(env_key)
            .trim_start_matches(self.separator.as_str());

        key.replace(self.separator.as_str(), ".").to_lowercase()
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EnvironmentConfig {
    fn contains_key(&self, key: &str) -> bool {
        self.env_vars.read().contains_key(key)
    }

    fn is_empty(&self) -> bool {
        self.env_vars.read().is_empty()
    }

    fn get_raw_property(&self, key: &str) -> Option<RawValue> {
        self.env_vars.read().get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.env_vars.read().keys().cloned().collect()
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

    fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
