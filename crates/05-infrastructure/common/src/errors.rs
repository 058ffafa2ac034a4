//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("不支持的配置值类型: 期望 {expected}, 实际 {actual}")]
    UnsupportedValueType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },

    #[error("配置层名称重复: {name}")]
    DuplicateLayerName { name: String },

    #[error("配置层不存在: {name}")]
    LayerNotFound { name: String },

    #[error("级联资源展开失败: {resource}, 原因: {message}")]
    CascadeExpansion { resource: String, message: String },

    #[error("无法解析占位符: ${{{placeholder}}}")]
    UnresolvedPlaceholder { placeholder: String },

    #[error("占位符循环引用或嵌套过深: {chain}")]
    InterpolationCycle { chain: String },

    #[error("配置资源不存在: {resource}")]
    ResourceNotFound { resource: String },

    #[error("配置资源加载失败: {resource}, 原因: {source}")]
    ResourceLoad {
        resource: String,
        source: Box<ConfigError>,
    },

    #[error("配置绑定失败: {path}, 原因: {message}")]
    MappingError { path: String, message: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("引擎设置加载失败: {message}")]
    SettingsError { message: String },

    #[error("配置事件分发失败: {message}")]
    EventDispatch { message: String },
}

impl ConfigError {
    /// 创建键不存在错误
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// 创建类型转换错误
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::TypeConversionError {
            message: message.into(),
        }
    }

    /// 创建级联展开错误
    pub fn cascade(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CascadeExpansion {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// 将底层错误包装为资源加载错误
    pub fn resource_load(resource: impl Into<String>, source: ConfigError) -> Self {
        Self::ResourceLoad {
            resource: resource.into(),
            source: Box::new(source),
        }
    }

    /// 创建绑定错误
    pub fn mapping(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MappingError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 创建事件分发错误
    pub fn event_dispatch(message: impl Into<String>) -> Self {
        Self::EventDispatch {
            message: message.into(),
        }
    }

    /// 是否为键不存在错误
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
