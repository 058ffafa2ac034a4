//! 可变配置层实现

use crate::interpolator::StringInterpolator;
use crate::listeners::ListenerRegistry;
use crate::owners::OwnerLinks;
use config_abstractions::{
    Config, ConfigChangeEvent, ConfigListener, ListenerId, RawValue,
};
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 可变配置层
///
/// 每次修改完成后在调用线程上同步通知监听器
pub struct DefaultSettableConfig {
    name: String,
    properties: RwLock<BTreeMap<String, RawValue>>,
    listeners: ListenerRegistry<dyn ConfigListener>,
    interpolator: StringInterpolator,
    owners: OwnerLinks,
}

impl std::fmt::Debug for DefaultSettableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultSettableConfig")
            .field("name", &self.name)
            .field("properties_count", &self.properties.read().len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl DefaultSettableConfig {
    /// 创建新的可变配置层
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: RwLock::new(BTreeMap::new()),
            listeners: ListenerRegistry::new(),
            interpolator: StringInterpolator::new(),
            owners: OwnerLinks::new(),
        }
    }

    /// 设置占位符解析器
    pub fn with_interpolator(mut self, interpolator: StringInterpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// 配置层名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 设置配置项
    pub fn set_property(&self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        let previous = self.properties.write().insert(key.clone(), value.clone());

        let event = match previous {
            Some(old) if old == value => return,
            Some(old) => ConfigChangeEvent::updated(key, old, value, self.name.clone()),
            None => ConfigChangeEvent::created(key, value, self.name.clone()),
        };
        debug!("配置项已设置: {} ({})", event.key.as_deref().unwrap_or_default(), self.name);
        self.fire(&event);
    }

    /// 清除配置项，返回旧值
    pub fn clear_property(&self, key: &str) -> Option<RawValue> {
        let previous = self.properties.write().remove(key);
        if let Some(old) = &previous {
            debug!("配置项已清除: {} ({})", key, self.name);
            self.fire(&ConfigChangeEvent::deleted(key, old.clone(), self.name.clone()));
        }
        previous
    }

    /// 批量设置配置项，完成后发送一次重载事件
    pub fn set_properties<K, V>(&self, properties: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<RawValue>,
    {
        {
            let mut guard = self.properties.write();
            for (key, value) in properties {
                guard.insert(key.into(), value.into());
            }
        }
        self.fire(&ConfigChangeEvent::reloaded(self.name.clone()));
    }

    /// 从另一个配置复制所有配置项
    pub fn set_properties_from(&self, source: &dyn Config) {
        let entries: Vec<(String, RawValue)> = source
            .keys()
            .into_iter()
            .filter_map(|key| source.get_raw_property(&key).map(|value| (key, value)))
            .collect();
        self.set_properties(entries);
    }

    fn fire(&self, event: &ConfigChangeEvent) {
        self.listeners
            .for_each(|listener| listener.on_config_changed(event));
    }
}

impl Config for DefaultSettableConfig {
    fn contains_key(&self, key: &str) -> bool {
        self.properties.read().contains_key(key)
    }

    fn is_empty(&self) -> bool {
        self.properties.read().is_empty()
    }

    fn get_raw_property(&self, key: &str) -> Option<RawValue> {
        self.properties.read().get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.properties.read().keys().cloned().collect()
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
