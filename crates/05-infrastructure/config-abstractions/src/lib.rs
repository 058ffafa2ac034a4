//! # Configuration Abstractions
//!
//! 配置引擎抽象层，定义分层配置、动态属性与级联加载的核心接口。
//!
//! ## 核心接口
//!
//! - [`Config`] - 配置层接口
//! - [`ConfigExt`] - 类型化读取扩展
//! - [`ConfigListener`] - 配置变更监听接口
//! - [`Property`] - 动态属性接口
//! - [`CascadeStrategy`] - 级联资源策略接口
//! - [`ResourceFetcher`] - 资源获取协作者接口

pub mod cascade;
pub mod config;
pub mod decode;
pub mod events;
pub mod fetcher;
pub mod property;
pub mod value;

pub use cascade::*;
pub use config::*;
pub use decode::*;
pub use events::*;
pub use fetcher::*;
pub use property::*;
pub use value::*;
