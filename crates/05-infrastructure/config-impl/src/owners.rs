//! 配置层所属组合配置的弱引用
//!
//! 配置层加入组合配置后，`${key}` 通过所属组合配置解析，
//! 这样层内的占位符可以引用其他层提供的键。

use config_abstractions::Config;
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// 配置层的所属组合配置列表
///
/// 同一个层可以同时属于多个组合配置，解析时使用最近加入且仍存活的那个
#[derive(Default)]
pub struct OwnerLinks {
    owners: RwLock<Vec<Weak<dyn Config>>>,
}

impl OwnerLinks {
    /// 创建空列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录所属组合配置，同时清理已释放的引用
    pub fn attach(&self, owner: Weak<dyn Config>) {
        let mut owners = self.owners.write();
        owners.retain(|existing| existing.strong_count() > 0 && !Weak::ptr_eq(existing, &owner));
        owners.push(owner);
    }

    /// 移除所属组合配置
    pub fn detach(&self, owner: &Weak<dyn Config>) {
        self.owners
            .write()
            .retain(|existing| !Weak::ptr_eq(existing, owner));
    }

    /// 当前有效的所属组合配置
    pub fn current(&self) -> Option<Arc<dyn Config>> {
        self.owners.read().iter().rev().find_map(Weak::upgrade)
    }

    /// 有所属组合配置时交给它解析，否则使用层自身的解析方式
    pub fn resolve<F>(&self, template: &str, own: F) -> Result<String, ConfigError>
    where
        F: FnOnce(&str) -> Result<String, ConfigError>,
    {
        match self.current() {
            Some(owner) => owner.resolve_placeholders(template),
            None => own(template),
        }
    }
}

// 克隆出的配置层尚未加入任何组合配置
impl Clone for OwnerLinks {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OwnerLinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerLinks")
            .field("owners_count", &self.owners.read().len())
            .finish()
    }
}
