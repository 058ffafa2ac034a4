//! 动态属性抽象接口

use crate::config::ListenerId;
use infrastructure_common::ConfigError;
use std::sync::Arc;

/// 属性监听器 trait
pub trait PropertyListener<T>: Send + Sync {
    /// 属性值发生变化
    fn on_change(&self, value: &T);

    /// 属性重新计算失败，属性保留上一次成功的值
    fn on_error(&self, error: &ConfigError) {
        let _ = error;
    }
}

impl<T, F> PropertyListener<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn on_change(&self, value: &T) {
        self(value);
    }
}

/// 动态属性 trait
///
/// 绑定到某个配置键的实时类型化句柄
pub trait Property<T>: Send + Sync {
    /// 获取当前缓存的值
    fn get(&self) -> T;

    /// 获取绑定的配置键
    fn key(&self) -> &str;

    /// 注册监听器，返回用于移除的标识
    fn add_listener(&self, listener: Arc<dyn PropertyListener<T>>) -> ListenerId;

    /// 移除监听器，返回是否确实移除
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// 取消订阅：脱离配置通知并清空监听器，之后 `get` 返回最后缓存的值
    fn unsubscribe(&self);
}
