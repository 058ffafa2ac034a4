//! 动态属性实现
//!
//! [`DefaultProperty`] 缓存某个配置键的类型化值，配置变更时在变更线程上
//! 同步重新计算（值可能经占位符依赖其他键，因此每个变更事件都会触发重新计算），
//! 值变化时通知所有监听器。属性只持有配置的弱引用，
//! 配置的监听器也只持有属性内部状态的弱引用，两者之间不会形成引用环。

use crate::listeners::ListenerRegistry;
use config_abstractions::{
    Config, ConfigChangeEvent, ConfigExt, ConfigListener, Decode, ListenerId, Property,
    PropertyListener,
};
use infrastructure_common::ConfigError;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

type Resolver<T> = Box<dyn Fn(&dyn Config) -> Result<T, ConfigError> + Send + Sync>;

struct PropertyCore<T> {
    key: String,
    config: Weak<dyn Config>,
    resolver: Resolver<T>,
    value: RwLock<T>,
    /// 串行化“解析、比较、写入、通知”，同一线程内允许重入
    update_lock: ReentrantMutex<()>,
    /// 每次写入新值时递增，重入的更新完成后旧的通知不再继续
    version: AtomicU64,
    listeners: ListenerRegistry<dyn PropertyListener<T>>,
    subscription: Mutex<Option<ListenerId>>,
}

impl<T> PropertyCore<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn update(&self) {
        let Some(config) = self.config.upgrade() else {
            debug!("配置已释放，属性保留缓存值: {}", self.key);
            return;
        };

        let _guard = self.update_lock.lock();
        match (self.resolver)(config.as_ref()) {
            Ok(value) => {
                let version = {
                    let mut current = self.value.write();
                    if *current == value {
                        return;
                    }
                    *current = value.clone();
                    self.version.fetch_add(1, Ordering::AcqRel) + 1
                };
                debug!("属性值已更新: {}", self.key);
                self.listeners.for_each(|listener| {
                    if self.version.load(Ordering::Acquire) == version {
                        listener.on_change(&value);
                    }
                });
            }
            Err(error) => {
                warn!("属性重新计算失败，保留缓存值: {} ({})", self.key, error);
                self.listeners.for_each(|listener| listener.on_error(&error));
            }
        }
    }

    fn detach(&self) {
        if let Some(id) = self.subscription.lock().take() {
            if let Some(config) = self.config.upgrade() {
                config.remove_listener(id);
            }
        }
    }
}

impl<T> Drop for PropertyCore<T> {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            if let Some(config) = self.config.upgrade() {
                config.remove_listener(id);
            }
        }
    }
}

/// 注册在配置上的更新器
struct PropertyUpdater<T> {
    core: Weak<PropertyCore<T>>,
}

impl<T> ConfigListener for PropertyUpdater<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn on_config_changed(&self, _event: &ConfigChangeEvent) {
        if let Some(core) = self.core.upgrade() {
            core.update();
        }
    }

    fn name(&self) -> &str {
        "PropertyUpdater"
    }
}

/// 默认动态属性
///
/// 克隆得到的句柄共享同一份缓存和监听器；最后一个句柄释放时自动取消订阅。
pub struct DefaultProperty<T> {
    core: Arc<PropertyCore<T>>,
}

impl<T> Clone for DefaultProperty<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DefaultProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultProperty")
            .field("key", &self.core.key)
            .field("value", &*self.core.value.read())
            .field("listeners", &self.core.listeners)
            .finish()
    }
}

impl<T> DefaultProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// 创建绑定到配置键的属性
    ///
    /// 初次解析失败时记录警告并以 `fallback` 作为初始值
    pub fn new<F>(key: impl Into<String>, config: &Arc<dyn Config>, fallback: T, resolver: F) -> Self
    where
        F: Fn(&dyn Config) -> Result<T, ConfigError> + Send + Sync + 'static,
    {
        let key = key.into();
        let initial = match resolver(config.as_ref()) {
            Ok(value) => value,
            Err(error) => {
                warn!("属性初次解析失败，使用默认值: {} ({})", key, error);
                fallback
            }
        };

        let core = Arc::new(PropertyCore {
            key,
            config: Arc::downgrade(config),
            resolver: Box::new(resolver),
            value: RwLock::new(initial),
            update_lock: ReentrantMutex::new(()),
            version: AtomicU64::new(0),
            listeners: ListenerRegistry::new(),
            subscription: Mutex::new(None),
        });

        let updater = Arc::new(PropertyUpdater {
            core: Arc::downgrade(&core),
        });
        *core.subscription.lock() = Some(config.add_listener(updater));
        debug!("创建动态属性: {}", core.key);

        Self { core }
    }

    /// 是否仍订阅配置变更
    pub fn is_subscribed(&self) -> bool {
        self.core.subscription.lock().is_some()
    }

    /// 派生映射属性
    pub fn map<U, F>(self, mapper: F) -> MappedProperty<T, U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        MappedProperty::new(Arc::new(self), mapper)
    }
}

impl<T> Property<T> for DefaultProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn get(&self) -> T {
        self.core.value.read().clone()
    }

    fn key(&self) -> &str {
        &self.core.key
    }

    fn add_listener(&self, listener: Arc<dyn PropertyListener<T>>) -> ListenerId {
        self.core.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.core.listeners.remove(id)
    }

    fn unsubscribe(&self) {
        debug!("取消属性订阅: {}", self.core.key);
        self.core.detach();
        self.core.listeners.clear();
    }
}

/// 映射属性
///
/// 包装一个委托属性，读取和通知时对值做映射；
/// 订阅相关操作全部转发给委托属性。
pub struct MappedProperty<T, U> {
    delegate: Arc<dyn Property<T>>,
    mapper: Arc<dyn Fn(&T) -> U + Send + Sync>,
}

impl<T, U> MappedProperty<T, U>
where
    T: 'static,
    U: Send + Sync + 'static,
{
    /// 创建映射属性
    pub fn new<F>(delegate: Arc<dyn Property<T>>, mapper: F) -> Self
    where
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        Self {
            delegate,
            mapper: Arc::new(mapper),
        }
    }
}

struct MappingListener<T, U> {
    mapper: Arc<dyn Fn(&T) -> U + Send + Sync>,
    inner: Arc<dyn PropertyListener<U>>,
}

impl<T, U> PropertyListener<T> for MappingListener<T, U> {
    fn on_change(&self, value: &T) {
        self.inner.on_change(&(self.mapper)(value));
    }

    fn on_error(&self, error: &ConfigError) {
        self.inner.on_error(error);
    }
}

impl<T, U> Property<U> for MappedProperty<T, U>
where
    T: 'static,
    U: Send + Sync + 'static,
{
    fn get(&self) -> U {
        (self.mapper)(&self.delegate.get())
    }

    fn key(&self) -> &str {
        self.delegate.key()
    }

    fn add_listener(&self, listener: Arc<dyn PropertyListener<U>>) -> ListenerId {
        self.delegate.add_listener(Arc::new(MappingListener {
            mapper: self.mapper.clone(),
            inner: listener,
        }))
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.delegate.remove_listener(id)
    }

    fn unsubscribe(&self) {
        self.delegate.unsubscribe();
    }
}

/// 属性工厂
#[derive(Clone)]
pub struct DefaultPropertyFactory {
    config: Arc<dyn Config>,
}

impl std::fmt::Debug for DefaultPropertyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPropertyFactory").finish_non_exhaustive()
    }
}

impl DefaultPropertyFactory {
    /// 创建绑定到指定配置的属性工厂
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self { config }
    }

    /// 获取属性构建器
    pub fn get_property(&self, key: impl Into<String>) -> PropertyBuilder {
        PropertyBuilder {
            config: self.config.clone(),
            key: key.into(),
        }
    }
}

/// 属性构建器，选择属性的目标类型
pub struct PropertyBuilder {
    config: Arc<dyn Config>,
    key: String,
}

impl PropertyBuilder {
    /// 类型化属性，键不存在时取默认值
    pub fn as_type<T: Decode>(self, default: T) -> DefaultProperty<T> {
        let key = self.key.clone();
        let fallback = default.clone();
        DefaultProperty::new(self.key, &self.config, fallback, move |config| {
            config.get_or(&key, default.clone())
        })
    }

    /// 可选属性，键不存在时为 `None`
    pub fn as_optional<T: Decode>(self) -> DefaultProperty<Option<T>> {
        let key = self.key.clone();
        DefaultProperty::new(self.key, &self.config, None, move |config| {
            config.get_optional(&key)
        })
    }

    /// 字符串属性
    pub fn as_string(self, default: &str) -> DefaultProperty<String> {
        self.as_type(default.to_string())
    }

    /// 列表属性，键不存在时为空列表
    pub fn as_list<T: Decode>(self) -> DefaultProperty<Vec<T>> {
        let key = self.key.clone();
        DefaultProperty::new(self.key, &self.config, Vec::new(), move |config| {
            config.get_list_or(&key, Vec::new())
        })
    }
}
