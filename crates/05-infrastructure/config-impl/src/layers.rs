//! 标准分层配置
//!
//! 按优先级从高到低组织以下配置层：
//!
//! | 层 | 类型 | 用途 |
//! |---|---|---|
//! | `runtime` | 可变 | 运行时覆盖 |
//! | `environment` | 环境变量 | 可选 |
//! | `application` | 组合 | 应用自身的配置资源 |
//! | `libraries` | 组合 | 组件通过配置源声明的资源 |
//! | `defaults` | 可变 | 代码内置默认值 |

use crate::composite::CompositeConfig;
use crate::environment::EnvironmentConfig;
use crate::property::DefaultPropertyFactory;
use crate::settable::DefaultSettableConfig;
use crate::settings::EngineSettings;
use config_abstractions::Config;
use infrastructure_common::ConfigError;
use std::sync::Arc;
use tracing::info;

/// 运行时覆盖层名称
pub const RUNTIME_LAYER: &str = "runtime";
/// 环境变量层名称
pub const ENVIRONMENT_LAYER: &str = "environment";
/// 应用配置层名称
pub const APPLICATION_LAYER: &str = "application";
/// 组件库配置层名称
pub const LIBRARIES_LAYER: &str = "libraries";
/// 默认值层名称
pub const DEFAULTS_LAYER: &str = "defaults";

/// 标准分层配置
///
/// 克隆得到的句柄共享同一组配置层
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    root: Arc<CompositeConfig>,
    runtime: Arc<DefaultSettableConfig>,
    environment: Option<Arc<EnvironmentConfig>>,
    application: Arc<CompositeConfig>,
    libraries: Arc<CompositeConfig>,
    defaults: Arc<DefaultSettableConfig>,
}

impl LayeredConfig {
    /// 使用默认设置创建不含环境变量层的分层配置
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// 创建构建器
    pub fn builder() -> LayeredConfigBuilder {
        LayeredConfigBuilder::default()
    }

    /// 根组合配置
    pub fn root(&self) -> Arc<CompositeConfig> {
        self.root.clone()
    }

    /// 以 `dyn Config` 形式返回根配置
    pub fn as_config(&self) -> Arc<dyn Config> {
        self.root.clone()
    }

    /// 运行时覆盖层
    pub fn runtime(&self) -> &Arc<DefaultSettableConfig> {
        &self.runtime
    }

    /// 环境变量层
    pub fn environment(&self) -> Option<&Arc<EnvironmentConfig>> {
        self.environment.as_ref()
    }

    /// 应用配置层
    pub fn application(&self) -> &Arc<CompositeConfig> {
        &self.application
    }

    /// 组件库配置层
    pub fn libraries(&self) -> &Arc<CompositeConfig> {
        &self.libraries
    }

    /// 默认值层
    pub fn defaults(&self) -> &Arc<DefaultSettableConfig> {
        &self.defaults
    }

    /// 设置应用配置资源，同名资源被替换
    pub fn set_application_config(&self, name: impl Into<String>, config: Arc<dyn Config>) {
        self.application.replace_config(name, config);
    }

    /// 添加组件库配置资源，优先级低于已添加的资源
    pub fn add_library_config(&self, name: impl Into<String>, config: Arc<dyn Config>) -> Result<(), ConfigError> {
        self.libraries.add_config(name, config)
    }

    /// 绑定到根配置的属性工厂
    pub fn property_factory(&self) -> DefaultPropertyFactory {
        DefaultPropertyFactory::new(self.as_config())
    }
}

/// [`LayeredConfig`] 构建器
#[derive(Debug, Default)]
pub struct LayeredConfigBuilder {
    settings: EngineSettings,
    environment: Option<EnvironmentConfig>,
}

impl LayeredConfigBuilder {
    /// 设置引擎设置
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 启用环境变量层
    pub fn with_environment(mut self, environment: EnvironmentConfig) -> Self {
        self.environment = Some(environment);
        self
    }

    /// 构建分层配置
    pub fn build(self) -> Result<LayeredConfig, ConfigError> {
        let interpolator = self.settings.interpolator();
        let root = CompositeConfig::with_interpolator("root", interpolator);
        let runtime = Arc::new(DefaultSettableConfig::new(RUNTIME_LAYER).with_interpolator(interpolator));
        let environment = self.environment.map(Arc::new);
        let application = CompositeConfig::with_interpolator(APPLICATION_LAYER, interpolator);
        let libraries = CompositeConfig::with_interpolator(LIBRARIES_LAYER, interpolator);
        let defaults = Arc::new(DefaultSettableConfig::new(DEFAULTS_LAYER).with_interpolator(interpolator));

        root.add_config(RUNTIME_LAYER, runtime.clone())?;
        if let Some(environment) = &environment {
            root.add_config(ENVIRONMENT_LAYER, environment.clone())?;
        }
        root.add_config(APPLICATION_LAYER, application.clone())?;
        root.add_config(LIBRARIES_LAYER, libraries.clone())?;
        root.add_config(DEFAULTS_LAYER, defaults.clone())?;

        info!("分层配置已创建: {:?}", root.config_names());
        Ok(LayeredConfig {
            root,
            runtime,
            environment,
            application,
            libraries,
            defaults,
        })
    }
}
