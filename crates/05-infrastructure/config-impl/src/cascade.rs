//! 级联策略实现
//!
//! 所有策略按从最通用到最具体的顺序生成候选资源名，基础名总在最前。
//! 合并优先级由加载器根据 [`config_abstractions::CascadePrecedence`] 决定。

use config_abstractions::{CascadeStrategy, Config, ConfigExt};
use infrastructure_common::ConfigError;
use std::cmp::Reverse;
use tracing::debug;

/// 单个资源名允许展开的最大候选数量
pub const MAX_CANDIDATES: usize = 64;

/// 维度策略允许的最大维度数量
pub const MAX_DIMENSIONS: usize = 6;

/// 不做级联，只返回资源名本身
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCascadeStrategy;

impl CascadeStrategy for NoCascadeStrategy {
    fn candidate_resource_names(
        &self,
        resource_name: &str,
        _config: &dyn Config,
    ) -> Result<Vec<String>, ConfigError> {
        Ok(vec![resource_name.to_string()])
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// 拼接策略
///
/// 每个参数是一个带占位符的后缀模板，例如 `${env}` 与 `${env}-${region}`，
/// 生成 `app`、`app-${env}`、`app-${env}-${region}`。
/// 占位符保留在候选名中，由加载器解析。
#[derive(Debug, Clone)]
pub struct ConcatCascadeStrategy {
    parameters: Vec<String>,
    separator: String,
}

impl ConcatCascadeStrategy {
    /// 创建拼接策略
    pub fn new<I, S>(parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            separator: "-".to_string(),
        }
    }

    /// 设置基础名与后缀之间的分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl CascadeStrategy for ConcatCascadeStrategy {
    fn candidate_resource_names(
        &self,
        resource_name: &str,
        _config: &dyn Config,
    ) -> Result<Vec<String>, ConfigError> {
        let mut candidates = Vec::with_capacity(self.parameters.len() + 1);
        candidates.push(resource_name.to_string());
        candidates.extend(
            self.parameters
                .iter()
                .map(|parameter| format!("{}{}{}", resource_name, self.separator, parameter)),
        );
        bounded(resource_name, candidates)
    }

    fn name(&self) -> &str {
        "concat"
    }
}

/// 维度策略
///
/// 从配置中读取每个维度的值，按维度子集生成候选名：
/// 先按子集大小、再按声明顺序排列。值缺失的维度被跳过。
#[derive(Debug, Clone)]
pub struct DimensionCascadeStrategy {
    dimensions: Vec<String>,
    separator: String,
}

impl DimensionCascadeStrategy {
    /// 创建维度策略，参数为存放维度值的配置键
    pub fn new<I, S>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            separator: "-".to_string(),
        }
    }

    /// 设置分隔符
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl CascadeStrategy for DimensionCascadeStrategy {
    fn candidate_resource_names(
        &self,
        resource_name: &str,
        config: &dyn Config,
    ) -> Result<Vec<String>, ConfigError> {
        if self.dimensions.len() > MAX_DIMENSIONS {
            return Err(ConfigError::cascade(
                resource_name,
                format!(
                    "维度数量 {} 超过上限 {}",
                    self.dimensions.len(),
                    MAX_DIMENSIONS
                ),
            ));
        }

        let mut values = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            match config.get_optional::<String>(dimension) {
                Ok(Some(value)) if !value.trim().is_empty() => values.push(value),
                Ok(_) => debug!("维度值缺失，跳过: {}", dimension),
                Err(error) => return Err(expansion_error(resource_name, error)),
            }
        }

        let mut subsets: Vec<u32> = (0..(1_u32 << values.len())).collect();
        subsets.sort_by_key(|mask| (mask.count_ones(), Reverse(mask.reverse_bits())));

        let candidates = subsets
            .into_iter()
            .map(|mask| {
                let mut name = resource_name.to_string();
                for (index, value) in values.iter().enumerate() {
                    if mask & (1 << index) != 0 {
                        name.push_str(&self.separator);
                        name.push_str(value);
                    }
                }
                name
            })
            .collect();
        bounded(resource_name, candidates)
    }

    fn name(&self) -> &str {
        "dimension"
    }
}

/// 将占位符循环等错误转换为级联展开错误
pub(crate) fn expansion_error(resource_name: &str, error: ConfigError) -> ConfigError {
    match error {
        ConfigError::CascadeExpansion { .. } => error,
        other => ConfigError::cascade(resource_name, other.to_string()),
    }
}

fn bounded(resource_name: &str, candidates: Vec<String>) -> Result<Vec<String>, ConfigError> {
    if candidates.len() > MAX_CANDIDATES {
        return Err(ConfigError::cascade(
            resource_name,
            format!("候选数量 {} 超过上限 {}", candidates.len(), MAX_CANDIDATES),
        ));
    }
    debug!("级联候选: {} -> {:?}", resource_name, candidates);
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_config::MapConfig;

    #[test]
    fn test_no_cascade() {
        let config = MapConfig::default();
        assert_eq!(
            NoCascadeStrategy
                .candidate_resource_names("app", &config)
                .unwrap(),
            vec!["app"]
        );
    }

    #[test]
    fn test_concat_keeps_placeholders() {
        let strategy = ConcatCascadeStrategy::new(["${env}", "${env}-${region}"]);
        let candidates = strategy
            .candidate_resource_names("app", &MapConfig::default())
            .unwrap();
        assert_eq!(candidates, vec!["app", "app-${env}", "app-${env}-${region}"]);

        let strategy = ConcatCascadeStrategy::new(["${env}"]).with_separator("_");
        assert_eq!(
            strategy
                .candidate_resource_names("app", &MapConfig::default())
                .unwrap(),
            vec!["app", "app_${env}"]
        );
    }

    #[test]
    fn test_concat_is_bounded() {
        let parameters: Vec<String> = (0..MAX_CANDIDATES).map(|i| i.to_string()).collect();
        let strategy = ConcatCascadeStrategy::new(parameters);
        assert!(matches!(
            strategy.candidate_resource_names("app", &MapConfig::default()),
            Err(ConfigError::CascadeExpansion { .. })
        ));
    }

    #[test]
    fn test_dimension_order() {
        let config = MapConfig::builder()
            .put("env", "dev")
            .put("region", "us")
            .build();
        let strategy = DimensionCascadeStrategy::new(["env", "region"]);
        assert_eq!(
            strategy.candidate_resource_names("app", &config).unwrap(),
            vec!["app", "app-dev", "app-us", "app-dev-us"]
        );
    }

    #[test]
    fn test_dimension_skips_absent_values() {
        let config = MapConfig::builder().put("region", "us").build();
        let strategy = DimensionCascadeStrategy::new(["env", "region"]);
        assert_eq!(
            strategy.candidate_resource_names("app", &config).unwrap(),
            vec!["app", "app-us"]
        );
    }

    #[test]
    fn test_dimension_limits() {
        let strategy = DimensionCascadeStrategy::new(["a", "b", "c", "d", "e", "f", "g"]);
        assert!(matches!(
            strategy.candidate_resource_names("app", &MapConfig::default()),
            Err(ConfigError::CascadeExpansion { .. })
        ));

        let config = MapConfig::builder()
            .put("a", "${b}")
            .put("b", "${a}")
            .build();
        let strategy = DimensionCascadeStrategy::new(["a"]);
        assert!(matches!(
            strategy.candidate_resource_names("app", &config),
            Err(ConfigError::CascadeExpansion { .. })
        ));
    }
}
