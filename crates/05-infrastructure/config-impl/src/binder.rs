//! 类型化配置绑定器实现
//!
//! 将配置快照转换为 `config` crate 的配置树，再反序列化为目标类型。
//! 字符串值在转换前解析占位符，`config` crate 负责字符串到数值等类型的转换。

use config_abstractions::{Config, RawValue};
use infrastructure_common::{ConfigError, Configurable};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// 类型化配置绑定器
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigBinder;

impl ConfigBinder {
    /// 创建新的类型化配置绑定器
    pub fn new() -> Self {
        Self
    }

    /// 将配置中指定路径下的内容绑定为类型 `T`，空路径表示整个配置
    pub fn bind_configuration<T>(&self, config: &dyn Config, path: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        debug!("绑定配置到类型: {} -> {}", path, std::any::type_name::<T>());

        let mut builder = config::Config::builder();
        for key in config.keys() {
            if !path.is_empty() && key != path && !key.starts_with(&format!("{}.", path)) {
                continue;
            }
            let Some(raw) = config.get_raw_property(&key) else {
                continue;
            };
            let value = to_value_kind(config, &raw).map_err(|e| ConfigError::mapping(&key, e.to_string()))?;
            builder = builder
                .set_override(key.as_str(), value)
                .map_err(|e| ConfigError::mapping(&key, e.to_string()))?;
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::mapping(path, e.to_string())
        })?;

        let result = if path.is_empty() {
            settings.try_deserialize::<T>()
        } else {
            match settings.get::<T>(path) {
                Err(config::ConfigError::NotFound(_)) => {
                    debug!("配置路径不存在，使用类型默认值: {}", path);
                    config::Config::default().try_deserialize::<T>()
                }
                other => other,
            }
        };

        result.map_err(|e| {
            error!("配置绑定失败: path={}, error={}", path, e);
            ConfigError::mapping(path, e.to_string())
        })
    }

    /// 将配置绑定到可配置组件
    pub fn bind<T>(&self, target: &mut T, config: &dyn Config) -> Result<(), ConfigError>
    where
        T: Configurable,
    {
        let path = T::get_config_path();
        debug!("绑定配置到实例: {} -> {}", path, std::any::type_name::<T>());

        let section: T::Config = self.bind_configuration(config, path)?;
        target
            .configure(section)
            .map_err(|e| ConfigError::mapping(path, e.to_string()))?;

        debug!("配置应用成功: {}", path);
        Ok(())
    }
}

fn to_value_kind(config: &dyn Config, raw: &RawValue) -> Result<config::ValueKind, ConfigError> {
    Ok(match raw {
        RawValue::String(text) => config::ValueKind::String(config.resolve_placeholders(text)?),
        RawValue::Integer(i) => config::ValueKind::I64(*i),
        RawValue::Float(f) => config::ValueKind::Float(*f),
        RawValue::Boolean(b) => config::ValueKind::Boolean(*b),
        RawValue::List(items) => config::ValueKind::Array(
            items
                .iter()
                .map(|item| to_value_kind(config, item).map(config::Value::from))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    })
}
