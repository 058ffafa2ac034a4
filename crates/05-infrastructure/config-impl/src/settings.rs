//! 配置引擎自身的设置

use crate::interpolator::{StringInterpolator, DEFAULT_MAX_DEPTH};
use config_abstractions::CascadePrecedence;
use infrastructure_common::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// 环境变量前缀
pub const SETTINGS_ENV_PREFIX: &str = "ADSP_CONFIG";

/// 配置引擎设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// 无法解析的占位符是否视为错误
    pub strict_interpolation: bool,
    /// 占位符最大嵌套深度
    pub max_interpolation_depth: usize,
    /// 级联候选的合并优先级
    pub cascade_precedence: CascadePrecedence,
    /// 第一个候选（基础资源）是否必须存在
    pub fail_on_first: bool,
    /// 文件资源根目录
    pub resource_root: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strict_interpolation: false,
            max_interpolation_depth: DEFAULT_MAX_DEPTH,
            cascade_precedence: CascadePrecedence::default(),
            fail_on_first: true,
            resource_root: PathBuf::from("config"),
        }
    }
}

impl EngineSettings {
    /// 从 `ADSP_CONFIG_*` 环境变量加载设置，未设置的字段取默认值
    ///
    /// 例如 `ADSP_CONFIG_STRICT_INTERPOLATION=true`、
    /// `ADSP_CONFIG_CASCADE_PRECEDENCE=least_specific_first`。
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(SETTINGS_ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .and_then(|built| built.try_deserialize::<Self>())
            .map_err(|e| ConfigError::SettingsError {
                message: e.to_string(),
            })?;

        debug!("引擎设置已加载: {:?}", settings);
        Ok(settings)
    }

    /// 按设置创建占位符解析器
    pub fn interpolator(&self) -> StringInterpolator {
        StringInterpolator::new()
            .with_strict(self.strict_interpolation)
            .with_max_depth(self.max_interpolation_depth)
    }
}
