//! 资源获取协作者抽象接口

use crate::value::RawValue;
use infrastructure_common::ConfigError;
use std::collections::BTreeMap;

/// 获取到的原始配置内容（扁平化的点分键）
pub type RawConfigContent = BTreeMap<String, RawValue>;

/// 资源获取者 trait
///
/// 负责按资源名获取并解析配置内容，配置引擎本身不读取存储或网络
pub trait ResourceFetcher: Send + Sync {
    /// 获取资源内容，资源不存在时返回 `Ok(None)`
    fn fetch(&self, resource_name: &str) -> Result<Option<RawConfigContent>, ConfigError>;

    /// 获取获取者名称
    fn name(&self) -> &str;
}
