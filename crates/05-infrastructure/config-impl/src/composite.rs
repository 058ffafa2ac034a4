//! 组合配置实现
//!
//! 按声明顺序组织多个具名配置层，查找时第一个包含该键的层胜出。
//! 层列表以写时复制快照保存在 [`ArcSwap`] 中：读取从不阻塞，
//! 也不会看到部分更新的层列表；修改操作由互斥锁串行化。

use crate::interpolator::StringInterpolator;
use crate::listeners::ListenerRegistry;
use crate::owners::OwnerLinks;
use arc_swap::ArcSwap;
use config_abstractions::{
    Config, ConfigChangeEvent, ConfigChangeEventType, ConfigListener, ListenerId, RawValue,
};
use infrastructure_common::ConfigError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 组合配置中的一个具名配置层
#[derive(Clone)]
struct Layer {
    name: String,
    config: Arc<dyn Config>,
    subscription: ListenerId,
}

/// 将子层事件转发到组合配置的监听器
///
/// 只持有组合配置的弱引用，子层不会因此延长组合配置的生命周期
struct LayerRelay {
    parent: Weak<CompositeConfig>,
    layer: String,
}

impl ConfigListener for LayerRelay {
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        if let Some(parent) = self.parent.upgrade() {
            parent.fire(&event.clone().relayed_through(&self.layer));
        }
    }

    fn name(&self) -> &str {
        "LayerRelay"
    }
}

/// 组合配置
pub struct CompositeConfig {
    name: String,
    layers: ArcSwap<Vec<Layer>>,
    mutation: Mutex<()>,
    listeners: ListenerRegistry<dyn ConfigListener>,
    interpolator: StringInterpolator,
    owners: OwnerLinks,
    self_ref: Weak<CompositeConfig>,
}

impl std::fmt::Debug for CompositeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConfig")
            .field("name", &self.name)
            .field("layers", &self.config_names())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl CompositeConfig {
    /// 创建新的组合配置
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_interpolator(name, StringInterpolator::new())
    }

    /// 使用指定的占位符解析器创建组合配置
    pub fn with_interpolator(name: impl Into<String>, interpolator: StringInterpolator) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|self_ref| Self {
            name,
            layers: ArcSwap::from_pointee(Vec::new()),
            mutation: Mutex::new(()),
            listeners: ListenerRegistry::new(),
            interpolator,
            owners: OwnerLinks::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// 组合配置名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 在末尾（最低优先级）添加配置层
    pub fn add_config(&self, name: impl Into<String>, config: Arc<dyn Config>) -> Result<(), ConfigError> {
        self.insert_config(usize::MAX, name, config)
    }

    /// 在指定位置插入配置层，位置超出范围时追加到末尾
    pub fn insert_config(
        &self,
        index: usize,
        name: impl Into<String>,
        config: Arc<dyn Config>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        {
            let _guard = self.mutation.lock();
            let current = self.layers.load_full();
            if current.iter().any(|layer| layer.name == name) {
                return Err(ConfigError::DuplicateLayerName { name });
            }

            let layer = self.subscribe(&name, config);
            let mut next = (*current).clone();
            next.insert(index.min(next.len()), layer);
            self.layers.store(Arc::new(next));
        }

        info!("添加配置层: {} -> {}", name, self.name);
        self.fire(&ConfigChangeEvent::layer_changed(
            ConfigChangeEventType::LayerAdded,
            name,
        ));
        Ok(())
    }

    /// 替换同名配置层，不存在时追加到末尾
    pub fn replace_config(&self, name: impl Into<String>, config: Arc<dyn Config>) {
        let name = name.into();
        let replaced = {
            let _guard = self.mutation.lock();
            let current = self.layers.load_full();
            let layer = self.subscribe(&name, config);
            let mut next = (*current).clone();

            let replaced = match next.iter().position(|existing| existing.name == name) {
                Some(position) => {
                    let old = std::mem::replace(&mut next[position], layer);
                    self.release(&old, Some(&next[position].config));
                    true
                }
                None => {
                    next.push(layer);
                    false
                }
            };
            self.layers.store(Arc::new(next));
            replaced
        };

        let event_type = if replaced {
            info!("替换配置层: {} -> {}", name, self.name);
            ConfigChangeEventType::LayerReplaced
        } else {
            info!("添加配置层: {} -> {}", name, self.name);
            ConfigChangeEventType::LayerAdded
        };
        self.fire(&ConfigChangeEvent::layer_changed(event_type, name));
    }

    /// 移除配置层，返回被移除的配置
    pub fn remove_config(&self, name: &str) -> Option<Arc<dyn Config>> {
        let removed = {
            let _guard = self.mutation.lock();
            let current = self.layers.load_full();
            let position = current.iter().position(|layer| layer.name == name)?;

            let mut next = (*current).clone();
            let removed = next.remove(position);
            self.release(&removed, None);
            self.layers.store(Arc::new(next));
            removed.config
        };

        info!("移除配置层: {} -> {}", name, self.name);
        self.fire(&ConfigChangeEvent::layer_changed(
            ConfigChangeEventType::LayerRemoved,
            name,
        ));
        Some(removed)
    }

    /// 将配置层移动到指定位置（重新排序）
    pub fn move_config(&self, name: &str, index: usize) -> Result<(), ConfigError> {
        {
            let _guard = self.mutation.lock();
            let current = self.layers.load_full();
            let position = current
                .iter()
                .position(|layer| layer.name == name)
                .ok_or_else(|| ConfigError::LayerNotFound {
                    name: name.to_string(),
                })?;

            let mut next = (*current).clone();
            let layer = next.remove(position);
            next.insert(index.min(next.len()), layer);
            self.layers.store(Arc::new(next));
        }

        info!("调整配置层顺序: {} -> 位置 {} ({})", name, index, self.name);
        self.fire(&ConfigChangeEvent::layer_changed(
            ConfigChangeEventType::LayersReordered,
            name,
        ));
        Ok(())
    }

    /// 按优先级顺序返回配置层名称
    pub fn config_names(&self) -> Vec<String> {
        self.layers
            .load()
            .iter()
            .map(|layer| layer.name.clone())
            .collect()
    }

    /// 按名称获取配置层
    pub fn get_config(&self, name: &str) -> Option<Arc<dyn Config>> {
        self.layers
            .load()
            .iter()
            .find(|layer| layer.name == name)
            .map(|layer| layer.config.clone())
    }

    /// 是否包含指定名称的配置层
    pub fn contains_config(&self, name: &str) -> bool {
        self.layers.load().iter().any(|layer| layer.name == name)
    }

    /// 配置层数量
    pub fn layer_count(&self) -> usize {
        self.layers.load().len()
    }

    fn subscribe(&self, name: &str, config: Arc<dyn Config>) -> Layer {
        let relay = Arc::new(LayerRelay {
            parent: self.self_ref.clone(),
            layer: name.to_string(),
        });
        let subscription = config.add_listener(relay);
        config.attach_owner(self.as_owner());
        Layer {
            name: name.to_string(),
            config,
            subscription,
        }
    }

    /// 取消对子层的订阅；替换为同一个配置实例时保留所属关系
    fn release(&self, layer: &Layer, successor: Option<&Arc<dyn Config>>) {
        layer.config.remove_listener(layer.subscription);
        if !successor.is_some_and(|next| Arc::ptr_eq(next, &layer.config)) {
            layer.config.detach_owner(&self.as_owner());
        }
    }

    fn as_owner(&self) -> Weak<dyn Config> {
        self.self_ref.clone()
    }

    fn fire(&self, event: &ConfigChangeEvent) {
        debug!(
            "分发配置变更事件: {:?} from {} ({})",
            event.event_type, event.source, self.name
        );
        self.listeners
            .for_each(|listener| listener.on_config_changed(event));
    }
}

impl Drop for CompositeConfig {
    fn drop(&mut self) {
        for layer in self.layers.load().iter() {
            self.release(layer, None);
        }
    }
}

impl Config for CompositeConfig {
    fn contains_key(&self, key: &str) -> bool {
        self.layers
            .load()
            .iter()
            .any(|layer| layer.config.contains_key(key))
    }

    fn is_empty(&self) -> bool {
        self.layers.load().iter().all(|layer| layer.config.is_empty())
    }

    fn get_raw_property(&self, key: &str) -> Option<RawValue> {
        let layers = self.layers.load();
        layers
            .iter()
            .find_map(|layer| layer.config.get_raw_property(key))
    }

    fn keys(&self) -> Vec<String> {
        let layers = self.layers.load();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for layer in layers.iter() {
            for key in layer.config.keys() {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
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
