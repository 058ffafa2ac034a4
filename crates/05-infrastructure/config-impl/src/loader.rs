//! 配置加载器实现
//!
//! 通过级联策略把资源名展开为候选列表，逐个获取候选资源，
//! 并按合并优先级组装为一个 [`CompositeConfig`]。

use crate::cascade::{expansion_error, NoCascadeStrategy};
use crate::composite::CompositeConfig;
use crate::interpolator::StringInterpolator;
use crate::map_config::MapConfig;
use crate::settings::EngineSettings;
use config_abstractions::{
    CascadePrecedence, CascadeStrategy, Config, RawConfigContent, ResourceFetcher,
};
use infrastructure_common::ConfigError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 默认配置加载器
#[derive(Clone)]
pub struct DefaultConfigLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    lookup: Arc<dyn Config>,
    default_strategy: Arc<dyn CascadeStrategy>,
    precedence: CascadePrecedence,
    fail_on_first: bool,
    interpolator: StringInterpolator,
}

impl std::fmt::Debug for DefaultConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultConfigLoader")
            .field("fetcher", &self.fetcher.name())
            .field("default_strategy", &self.default_strategy.name())
            .field("precedence", &self.precedence)
            .field("fail_on_first", &self.fail_on_first)
            .finish()
    }
}

impl DefaultConfigLoader {
    /// 创建配置加载器
    ///
    /// `lookup` 用于解析级联候选名中的占位符，通常是应用的根配置
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, lookup: Arc<dyn Config>) -> Self {
        Self {
            fetcher,
            lookup,
            default_strategy: Arc::new(NoCascadeStrategy),
            precedence: CascadePrecedence::default(),
            fail_on_first: true,
            interpolator: StringInterpolator::new(),
        }
    }

    /// 应用引擎设置
    pub fn with_settings(mut self, settings: &EngineSettings) -> Self {
        self.precedence = settings.cascade_precedence;
        self.fail_on_first = settings.fail_on_first;
        self.interpolator = settings.interpolator();
        self
    }

    /// 设置默认级联策略
    pub fn with_default_strategy(mut self, strategy: Arc<dyn CascadeStrategy>) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// 创建单次加载的构建器
    pub fn new_loader(&self) -> Loader<'_> {
        Loader {
            parent: self,
            strategy: self.default_strategy.clone(),
            precedence: self.precedence,
            fail_on_first: self.fail_on_first,
        }
    }

    /// 使用默认选项加载资源
    pub fn load(&self, resource_name: &str) -> Result<Arc<CompositeConfig>, ConfigError> {
        self.new_loader().load(resource_name)
    }

    /// 解析候选名中的占位符，无法解析的占位符保留原样
    fn resolve_candidate(&self, candidate: &str) -> Result<String, ConfigError> {
        self.interpolator
            .with_strict(false)
            .resolve(candidate, &|key: &str| self.lookup.lookup(key))
    }

    fn fetch(&self, candidate: &str, required: bool) -> Result<Option<RawConfigContent>, ConfigError> {
        match self.fetcher.fetch(candidate) {
            Ok(Some(content)) => Ok(Some(content)),
            Ok(None) if required => Err(ConfigError::resource_load(
                candidate,
                ConfigError::ResourceNotFound {
                    resource: candidate.to_string(),
                },
            )),
            Ok(None) => {
                debug!("跳过不存在的候选资源: {}", candidate);
                Ok(None)
            }
            Err(error) if required => Err(ConfigError::resource_load(candidate, error)),
            Err(error) => {
                warn!("候选资源加载失败，已跳过: {} ({})", candidate, error);
                Ok(None)
            }
        }
    }
}

/// 单次加载构建器
pub struct Loader<'a> {
    parent: &'a DefaultConfigLoader,
    strategy: Arc<dyn CascadeStrategy>,
    precedence: CascadePrecedence,
    fail_on_first: bool,
}

impl Loader<'_> {
    /// 设置级联策略
    pub fn with_cascade_strategy(mut self, strategy: Arc<dyn CascadeStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// 设置合并优先级
    pub fn with_precedence(mut self, precedence: CascadePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// 设置第一个候选是否必须存在
    pub fn with_fail_on_first(mut self, fail_on_first: bool) -> Self {
        self.fail_on_first = fail_on_first;
        self
    }

    /// 加载资源，返回以候选名命名各层的组合配置
    pub fn load(self, resource_name: &str) -> Result<Arc<CompositeConfig>, ConfigError> {
        let parent = self.parent;
        let candidates = self
            .strategy
            .candidate_resource_names(resource_name, parent.lookup.as_ref())
            .map_err(|e| expansion_error(resource_name, e))?;
        debug!(
            "加载配置资源: {} (策略 {}, {} 个候选)",
            resource_name,
            self.strategy.name(),
            candidates.len()
        );

        let mut resolved: Vec<(String, bool)> = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            let required = index == 0 && self.fail_on_first;
            let name = parent
                .resolve_candidate(candidate)
                .map_err(|e| expansion_error(resource_name, e))?;

            if name.contains("${") {
                if required {
                    return Err(ConfigError::resource_load(
                        name.clone(),
                        ConfigError::UnresolvedPlaceholder { placeholder: name },
                    ));
                }
                debug!("候选名包含未解析的占位符，已跳过: {}", name);
                continue;
            }
            if resolved.iter().any(|(existing, _)| *existing == name) {
                continue;
            }
            resolved.push((name, required));
        }

        let mut layers = Vec::with_capacity(resolved.len());
        for (name, required) in resolved {
            if let Some(content) = parent.fetch(&name, required)? {
                layers.push((name, content));
            }
        }

        if self.precedence == CascadePrecedence::MostSpecificFirst {
            layers.reverse();
        }

        let composite = CompositeConfig::with_interpolator(resource_name, parent.interpolator);
        for (name, content) in layers {
            let layer = MapConfig::new(content).with_interpolator(parent.interpolator);
            composite.add_config(name, Arc::new(layer))?;
        }

        info!(
            "配置资源已加载: {} -> {:?}",
            resource_name,
            composite.config_names()
        );
        Ok(composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::ConcatCascadeStrategy;
    use crate::fetchers::InMemoryResourceFetcher;
    use config_abstractions::ConfigExt;

    fn fetcher() -> Arc<InMemoryResourceFetcher> {
        Arc::new(
            InMemoryResourceFetcher::new()
                .with_resource("app", [("level", "base"), ("only.base", "yes")])
                .with_resource("app-dev-us", [("level", "dev-us")]),
        )
    }

    fn lookup() -> Arc<dyn Config> {
        Arc::new(
            MapConfig::builder()
                .put("env", "dev")
                .put("region", "us")
                .build(),
        )
    }

    fn concat() -> Arc<dyn CascadeStrategy> {
        Arc::new(ConcatCascadeStrategy::new(["${env}", "${env}-${region}"]))
    }

    #[test]
    fn test_default_strategy_loads_base_only() {
        let loader = DefaultConfigLoader::new(fetcher(), lookup());
        let config = loader.load("app").unwrap();
        assert_eq!(config.config_names(), vec!["app"]);
        assert_eq!(config.get_string("level").unwrap(), "base");
    }

    #[test]
    fn test_cascade_most_specific_first() {
        let loader = DefaultConfigLoader::new(fetcher(), lookup());
        let config = loader
            .new_loader()
            .with_cascade_strategy(concat())
            .load("app")
            .unwrap();

        assert_eq!(config.config_names(), vec!["app-dev-us", "app"]);
        assert_eq!(config.get_string("level").unwrap(), "dev-us");
        assert_eq!(config.get_string("only.base").unwrap(), "yes");
    }

    #[test]
    fn test_cascade_least_specific_first() {
        let loader = DefaultConfigLoader::new(fetcher(), lookup());
        let config = loader
            .new_loader()
            .with_cascade_strategy(concat())
            .with_precedence(CascadePrecedence::LeastSpecificFirst)
            .load("app")
            .unwrap();

        assert_eq!(config.config_names(), vec!["app", "app-dev-us"]);
        assert_eq!(config.get_string("level").unwrap(), "base");
    }

    #[test]
    fn test_missing_base_is_resource_load_error() {
        let loader = DefaultConfigLoader::new(fetcher(), lookup());
        let error = loader.load("other").unwrap_err();
        assert!(matches!(
            error,
            ConfigError::ResourceLoad { ref resource, ref source }
                if resource == "other" && matches!(**source, ConfigError::ResourceNotFound { .. })
        ));

        let config = loader
            .new_loader()
            .with_fail_on_first(false)
            .load("other")
            .unwrap();
        assert_eq!(config.layer_count(), 0);
        assert!(config.is_empty());
    }

    #[test]
    fn test_unresolved_and_duplicate_candidates() {
        let lookup: Arc<dyn Config> = Arc::new(MapConfig::builder().put("env", "dev").build());
        let fetcher = Arc::new(
            InMemoryResourceFetcher::new()
                .with_resource("app", [("level", "base")])
                .with_resource("app-dev", [("level", "dev")]),
        );
        let strategy = Arc::new(ConcatCascadeStrategy::new(["${env}", "${env}", "${env}-${region}"]));
        let loader = DefaultConfigLoader::new(fetcher, lookup).with_default_strategy(strategy);

        let config = loader.load("app").unwrap();
        assert_eq!(config.config_names(), vec!["app-dev", "app"]);
    }

    #[test]
    fn test_optional_fetch_failure_is_skipped() {
        struct FlakyFetcher;

        impl ResourceFetcher for FlakyFetcher {
            fn fetch(&self, resource_name: &str) -> Result<Option<RawConfigContent>, ConfigError> {
                if resource_name == "app" {
                    Ok(Some(RawConfigContent::new()))
                } else {
                    Err(ConfigError::conversion("broken"))
                }
            }

            fn name(&self) -> &str {
                "flaky"
            }
        }

        let loader = DefaultConfigLoader::new(Arc::new(FlakyFetcher), lookup());
        let config = loader
            .new_loader()
            .with_cascade_strategy(concat())
            .load("app")
            .unwrap();
        assert_eq!(config.config_names(), vec!["app"]);

        assert!(matches!(
            loader.load("other"),
            Err(ConfigError::ResourceLoad { .. })
        ));
    }

    #[test]
    fn test_settings_are_applied() {
        let settings = EngineSettings {
            cascade_precedence: CascadePrecedence::LeastSpecificFirst,
            fail_on_first: false,
            ..EngineSettings::default()
        };
        let loader = DefaultConfigLoader::new(fetcher(), lookup()).with_settings(&settings);
        let config = loader
            .new_loader()
            .with_cascade_strategy(concat())
            .load("app")
            .unwrap();
        assert_eq!(config.config_names(), vec!["app", "app-dev-us"]);
        assert!(loader.load("missing").is_ok());
    }
}
