//! 配置变更事件定义

use crate::value::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 配置变更事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigChangeEvent {
    /// 事件类型
    pub event_type: ConfigChangeEventType,
    /// 变更的键，`None` 表示任意键都可能已变化
    pub key: Option<String>,
    /// 旧值
    pub old_value: Option<RawValue>,
    /// 新值
    pub new_value: Option<RawValue>,
    /// 事件时间
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// 事件来源（配置层名称，经组合配置转发时以 `/` 连接）
    pub source: String,
    /// 额外元数据
    pub metadata: HashMap<String, String>,
}

impl ConfigChangeEvent {
    fn new(
        event_type: ConfigChangeEventType,
        key: Option<String>,
        old_value: Option<RawValue>,
        new_value: Option<RawValue>,
        source: String,
    ) -> Self {
        Self {
            event_type,
            key,
            old_value,
            new_value,
            timestamp: chrono::Utc::now(),
            source,
            metadata: HashMap::new(),
        }
    }

    /// 创建配置创建事件
    pub fn created(key: impl Into<String>, value: RawValue, source: impl Into<String>) -> Self {
        Self::new(
            ConfigChangeEventType::Created,
            Some(key.into()),
            None,
            Some(value),
            source.into(),
        )
    }

    /// 创建配置更新事件
    pub fn updated(
        key: impl Into<String>,
        old_value: RawValue,
        new_value: RawValue,
        source: impl Into<String>,
    ) -> Self {
        Self::new(
            ConfigChangeEventType::Updated,
            Some(key.into()),
            Some(old_value),
            Some(new_value),
            source.into(),
        )
    }

    /// 创建配置删除事件
    pub fn deleted(key: impl Into<String>, old_value: RawValue, source: impl Into<String>) -> Self {
        Self::new(
            ConfigChangeEventType::Deleted,
            Some(key.into()),
            Some(old_value),
            None,
            source.into(),
        )
    }

    /// 创建配置重载事件
    pub fn reloaded(source: impl Into<String>) -> Self {
        Self::new(ConfigChangeEventType::Reloaded, None, None, None, source.into())
    }

    /// 创建配置层变更事件（添加、移除、替换、重排）
    pub fn layer_changed(event_type: ConfigChangeEventType, layer: impl Into<String>) -> Self {
        let layer = layer.into();
        Self::new(event_type, None, None, None, layer.clone()).with_metadata("layer", layer)
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 经组合配置转发时，在来源前追加层名称
    pub fn relayed_through(mut self, layer: &str) -> Self {
        self.source = if self.source.is_empty() {
            layer.to_string()
        } else {
            format!("{}/{}", layer, self.source)
        };
        self
    }
}

/// 配置变更事件类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConfigChangeEventType {
    /// 配置项创建
    Created,
    /// 配置项更新
    Updated,
    /// 配置项删除
    Deleted,
    /// 配置重载
    Reloaded,
    /// 配置层添加
    LayerAdded,
    /// 配置层移除
    LayerRemoved,
    /// 配置层替换
    LayerReplaced,
    /// 配置层重新排序
    LayersReordered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_keys() {
        let event = ConfigChangeEvent::created("limit", RawValue::Integer(1), "runtime");
        assert_eq!(event.key.as_deref(), Some("limit"));

        let event = ConfigChangeEvent::layer_changed(ConfigChangeEventType::LayerAdded, "app");
        assert_eq!(event.key, None);
        assert_eq!(event.metadata.get("layer").map(String::as_str), Some("app"));
    }

    #[test]
    fn test_relayed_source_path() {
        let event = ConfigChangeEvent::reloaded("app-dev")
            .relayed_through("app")
            .relayed_through("libraries");
        assert_eq!(event.source, "libraries/app/app-dev");
    }
}
