//! 级联资源策略抽象接口

use crate::config::Config;
use infrastructure_common::ConfigError;
use serde::{Deserialize, Serialize};

/// 级联策略 trait
///
/// 将逻辑资源名展开为有序的候选资源名列表。
/// 约定：候选从最通用到最具体排列（基础名在最前）。
pub trait CascadeStrategy: Send + Sync {
    /// 生成候选资源名
    fn candidate_resource_names(
        &self,
        resource_name: &str,
        config: &dyn Config,
    ) -> Result<Vec<String>, ConfigError>;

    /// 获取策略名称
    fn name(&self) -> &str;
}

/// 级联候选的合并优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePrecedence {
    /// 最具体的候选优先（位于组合配置的最前面）
    #[default]
    MostSpecificFirst,
    /// 最通用的候选优先
    LeastSpecificFirst,
}
