//! 监听器注册表

use config_abstractions::ListenerId;
use parking_lot::RwLock;
use std::sync::Arc;

/// 线程安全的监听器注册表
///
/// 分发时遍历注册表快照，调用前再次确认监听器仍已注册：
/// 在分发过程中被移除的监听器不会再被同一线程调用；
/// 其他线程并发移除时，最多完成正在进行的那一次调用。
pub struct ListenerRegistry<L: ?Sized> {
    entries: RwLock<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 注册监听器
    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.write().push((id, listener));
        id
    }

    /// 移除监听器，返回是否确实移除
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() < before
    }

    /// 是否包含指定监听器
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.read().iter().any(|(entry_id, _)| *entry_id == id)
    }

    /// 清空所有监听器
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// 监听器数量
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// 是否没有监听器
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 按注册顺序依次调用监听器
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.entries.read().clone();
        for (id, listener) in snapshot {
            if self.contains(id) {
                f(&listener);
            }
        }
    }
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> std::fmt::Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    trait Counter: Send + Sync {
        fn hit(&self);
    }

    struct Hits(AtomicUsize);

    impl Counter for Hits {
        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry: ListenerRegistry<dyn Fn(&mut Vec<u8>) + Send + Sync> = ListenerRegistry::new();
        registry.add(Arc::new(|seen: &mut Vec<u8>| seen.push(1)));
        registry.add(Arc::new(|seen: &mut Vec<u8>| seen.push(2)));

        let mut seen = Vec::new();
        registry.for_each(|listener| listener(&mut seen));
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_removed_during_dispatch_is_skipped() {
        let registry: Arc<ListenerRegistry<dyn Counter>> = Arc::new(ListenerRegistry::new());
        let second = Arc::new(Hits(AtomicUsize::new(0)));
        let second_id = Arc::new(Mutex::new(None));

        struct Remover {
            registry: Arc<ListenerRegistry<dyn Counter>>,
            target: Arc<Mutex<Option<ListenerId>>>,
        }

        impl Counter for Remover {
            fn hit(&self) {
                if let Some(id) = *self.target.lock().unwrap() {
                    self.registry.remove(id);
                }
            }
        }

        registry.add(Arc::new(Remover {
            registry: registry.clone(),
            target: second_id.clone(),
        }));
        let id = registry.add(second.clone());
        *second_id.lock().unwrap() = Some(id);

        registry.for_each(|listener| listener.hit());
        assert_eq!(second.0.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_unknown_listener() {
        let registry: ListenerRegistry<dyn Counter> = ListenerRegistry::new();
        assert!(!registry.remove(ListenerId::new()));
        assert!(registry.is_empty());
    }
}
