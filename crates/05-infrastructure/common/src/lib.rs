//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 配置引擎各层共享的错误类型与绑定接口。
//!
//! ## 核心组件
//!
//! - [`ConfigError`] - 配置引擎统一错误类型
//! - [`Configurable`] - 可绑定配置的组件 trait

pub mod configuration;
pub mod errors;

pub use configuration::*;
pub use errors::*;
