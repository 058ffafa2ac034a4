//! # Configuration Implementation
//!
//! 配置引擎的具体实现：分层配置、组合配置、动态属性、级联加载与绑定。
//!
//! ## 主要组件
//!
//! - [`StringInterpolator`] - `${...}` 占位符解析器
//! - [`MapConfig`] / [`DefaultSettableConfig`] / [`EnvironmentConfig`] - 单层配置
//! - [`CompositeConfig`] - 第一个命中的层胜出的组合配置
//! - [`DefaultPropertyFactory`] - 动态属性工厂
//! - [`NoCascadeStrategy`] / [`ConcatCascadeStrategy`] / [`DimensionCascadeStrategy`] - 级联策略
//! - [`DefaultConfigLoader`] - 级联资源加载器
//! - [`LayeredConfig`] - 标准分层配置
//! - [`ConfigurationProvisioner`] - 组件配置供给
//! - [`ConfigBinder`] - 类型化配置绑定器
//! - [`ConfigEventHandler`] - 异步事件分发

pub mod binder;
pub mod cascade;
pub mod composite;
pub mod environment;
pub mod event_handler;
pub mod fetchers;
pub mod interpolator;
pub mod layers;
pub mod listeners;
pub mod loader;
pub mod map_config;
pub mod owners;
pub mod property;
pub mod provisioning;
pub mod settable;
pub mod settings;

pub use binder::*;
pub use cascade::*;
pub use composite::*;
pub use environment::*;
pub use event_handler::*;
pub use fetchers::*;
pub use interpolator::*;
pub use layers::*;
pub use listeners::*;
pub use loader::*;
pub use map_config::*;
pub use owners::*;
pub use property::*;
pub use provisioning::*;
pub use settable::*;
pub use settings::*;
