//! 配置层抽象接口

use crate::decode::{decode_element, Decode};
use crate::events::ConfigChangeEvent;
use crate::value::RawValue;
use infrastructure_common::ConfigError;
use std::fmt;
use std::sync::{Arc, Weak};

/// 监听器注册标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(uuid::Uuid);

impl ListenerId {
    /// 生成新的监听器标识
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 占位符查找能力
pub trait StrLookup {
    /// 查找占位符名称对应的值
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<F> StrLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// 配置变更监听器 trait
///
/// 监听器在变更发生的线程上被同步调用
pub trait ConfigListener: Send + Sync {
    /// 处理配置变更事件
    fn on_config_changed(&self, event: &ConfigChangeEvent);

    /// 获取监听器名称
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<F> ConfigListener for F
where
    F: Fn(&ConfigChangeEvent) + Send + Sync,
{
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        self(event);
    }
}

/// 配置层 trait
///
/// 有序、可查询的键值映射。所有读取都是对当前状态的纯读取。
pub trait Config: Send + Sync {
    /// 检查配置键是否存在
    fn contains_key(&self, key: &str) -> bool;

    /// 是否不包含任何键
    fn is_empty(&self) -> bool;

    /// 获取原始配置值
    fn get_raw_property(&self, key: &str) -> Option<RawValue>;

    /// 获取所有配置键
    ///
    /// 返回当前状态的快照，顺序在同一快照内稳定，可重复遍历。
    fn keys(&self) -> Vec<String>;

    /// 解析字符串中的占位符
    ///
    /// 配置层属于某个组合配置时以该组合配置为查找源，否则以本配置为查找源
    fn resolve_placeholders(&self, template: &str) -> Result<String, ConfigError>;

    /// 注册变更监听器
    fn add_listener(&self, listener: Arc<dyn ConfigListener>) -> ListenerId;

    /// 移除变更监听器，返回是否确实移除
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// 加入组合配置时由组合配置调用
    fn attach_owner(&self, _owner: Weak<dyn Config>) {}

    /// 离开组合配置时由组合配置调用
    fn detach_owner(&self, _owner: &Weak<dyn Config>) {}

    /// 以字符串形式查找原始值，作为占位符解析的查找源
    fn lookup(&self, key: &str) -> Option<String> {
        self.get_raw_property(key).map(|value| value.to_string())
    }
}

/// 类型化读取扩展
///
/// 对所有 [`Config`]（包括 `dyn Config`）提供类型化读取方法
pub trait ConfigExt: Config {
    /// 读取并转换为目标类型，键不存在时返回 [`ConfigError::KeyNotFound`]
    fn get<T: Decode>(&self, key: &str) -> Result<T, ConfigError> {
        let raw = self
            .get_raw_property(key)
            .ok_or_else(|| ConfigError::key_not_found(key))?;
        self.convert(&raw)
    }

    /// 读取并转换为目标类型，键不存在时返回默认值
    fn get_or<T: Decode>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_raw_property(key) {
            Some(raw) => self.convert(&raw),
            None => Ok(default),
        }
    }

    /// 读取并转换为目标类型，键不存在时返回 `None`
    fn get_optional<T: Decode>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get_raw_property(key)
            .map(|raw| self.convert(&raw))
            .transpose()
    }

    /// 读取字符串
    fn get_string(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
    }

    /// 读取字符串，键不存在时返回默认值
    fn get_string_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        self.get_or(key, default.to_string())
    }

    /// 读取布尔值
    fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.get(key)
    }

    /// 读取整数
    fn get_i64(&self, key: &str) -> Result<i64, ConfigError> {
        self.get(key)
    }

    /// 读取列表
    ///
    /// 原生列表中与目标类型匹配的元素原样保留，字符串元素经解码，
    /// 其他元素返回 [`ConfigError::UnsupportedValueType`]。
    /// 字符串值按逗号拆分后逐个解码。
    fn get_list<T: Decode>(&self, key: &str) -> Result<Vec<T>, ConfigError> {
        let raw = self
            .get_raw_property(key)
            .ok_or_else(|| ConfigError::key_not_found(key))?;
        self.convert_list(&raw)
    }

    /// 读取列表，键不存在时返回默认值
    fn get_list_or<T: Decode>(&self, key: &str, default: Vec<T>) -> Result<Vec<T>, ConfigError> {
        match self.get_raw_property(key) {
            Some(raw) => self.convert_list(&raw),
            None => Ok(default),
        }
    }

    /// 将原始值转换为目标类型，字符串先解析占位符
    fn convert<T: Decode>(&self, raw: &RawValue) -> Result<T, ConfigError> {
        match raw {
            RawValue::String(text) => T::decode(&self.resolve_placeholders(text)?),
            native => T::from_native(native),
        }
    }

    /// 将原始值转换为目标类型的列表
    fn convert_list<T: Decode>(&self, raw: &RawValue) -> Result<Vec<T>, ConfigError> {
        let decode_string = |text: &str| T::decode(&self.resolve_placeholders(text)?);
        match raw {
            RawValue::List(items) => items
                .iter()
                .map(|item| decode_element(item, decode_string))
                .collect(),
            RawValue::String(text) => self
                .resolve_placeholders(text)?
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(T::decode)
                .collect(),
            scalar => Ok(vec![decode_element(scalar, decode_string)?]),
        }
    }
}

impl<C: Config + ?Sized> ConfigExt for C {}
