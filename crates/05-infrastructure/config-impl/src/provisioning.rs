//! 组件配置供给
//!
//! 组件通过 [`ConfigurationSource`] 声明自己依赖的配置资源。
//! 供给时按声明的逆序加载资源并追加到 `libraries` 层，
//! 因此最后声明的资源在这些资源中优先级最高；随后将根配置绑定到组件。

use crate::binder::ConfigBinder;
use crate::layers::LayeredConfig;
use crate::loader::DefaultConfigLoader;
use crate::settings::EngineSettings;
use config_abstractions::{CascadeStrategy, ResourceFetcher};
use infrastructure_common::{ConfigError, Configurable};
use std::sync::Arc;
use tracing::{debug, info};

/// 组件声明的配置资源
#[derive(Clone, Default)]
pub struct ConfigurationSource {
    resources: Vec<String>,
    cascade: Option<Arc<dyn CascadeStrategy>>,
}

impl std::fmt::Debug for ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationSource")
            .field("resources", &self.resources)
            .field("cascade", &self.cascade.as_ref().map(|strategy| strategy.name()))
            .finish()
    }
}

impl ConfigurationSource {
    /// 创建配置源
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            cascade: None,
        }
    }

    /// 指定级联策略，未指定时使用加载器的默认策略
    pub fn with_cascade_strategy(mut self, strategy: Arc<dyn CascadeStrategy>) -> Self {
        self.cascade = Some(strategy);
        self
    }

    /// 声明的资源名
    pub fn resources(&self) -> &[String] {
        &self.resources
    }
}

/// 配置供给器
#[derive(Debug, Clone)]
pub struct ConfigurationProvisioner {
    layered: LayeredConfig,
    loader: DefaultConfigLoader,
    binder: ConfigBinder,
}

impl ConfigurationProvisioner {
    /// 创建配置供给器，级联候选名以分层配置的根配置解析
    pub fn new(layered: LayeredConfig, fetcher: Arc<dyn ResourceFetcher>, settings: &EngineSettings) -> Self {
        let loader = DefaultConfigLoader::new(fetcher, layered.as_config()).with_settings(settings);
        Self {
            layered,
            loader,
            binder: ConfigBinder::new(),
        }
    }

    /// 替换加载器
    pub fn with_loader(mut self, loader: DefaultConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// 加载配置源中尚未加载的资源
    pub fn load_source(&self, source: &ConfigurationSource) -> Result<(), ConfigError> {
        let libraries = self.layered.libraries();
        for resource in source.resources.iter().rev() {
            if libraries.contains_config(resource) {
                debug!("配置资源已加载，跳过: {}", resource);
                continue;
            }

            let mut loader = self.loader.new_loader();
            if let Some(strategy) = &source.cascade {
                loader = loader.with_cascade_strategy(strategy.clone());
            }
            let loaded = loader.load(resource).map_err(|e| match e {
                ConfigError::ResourceLoad { .. } => e,
                other => ConfigError::resource_load(resource.as_str(), other),
            })?;

            match libraries.add_config(resource.as_str(), loaded) {
                Ok(()) => info!("组件配置资源已加载: {}", resource),
                Err(ConfigError::DuplicateLayerName { .. }) => {
                    debug!("配置资源已由其他线程加载: {}", resource);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    /// 加载配置源并将根配置绑定到组件
    pub fn on_provision<T>(&self, target: &mut T, source: &ConfigurationSource) -> Result<(), ConfigError>
    where
        T: Configurable,
    {
        self.load_source(source)?;
        self.binder.bind(target, self.layered.root().as_ref())
    }
}
