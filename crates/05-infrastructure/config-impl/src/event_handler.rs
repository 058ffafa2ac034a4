//! 配置变更事件处理器实现
//!
//! 配置层的通知总是在变更线程上同步发出。需要把监听器移出变更线程时，
//! 将 [`ConfigEventHandler::forwarder`] 注册到配置上，事件经通道转入后台任务分发。

use config_abstractions::{ConfigChangeEvent, ConfigChangeEventType, ConfigListener};
use infrastructure_common::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

/// 默认的事件通道容量
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// 配置事件处理器
///
/// 负责管理和异步分发配置变更事件到各个监听器
pub struct ConfigEventHandler {
    /// 事件监听器映射
    listeners: Arc<RwLock<HashMap<String, Arc<dyn ConfigListener>>>>,
    /// 事件分发通道
    event_sender: mpsc::Sender<ConfigChangeEvent>,
    /// 事件接收器（启动后移交给处理任务）
    event_receiver: Option<mpsc::Receiver<ConfigChangeEvent>>,
    /// 是否正在运行
    is_running: bool,
    /// 事件处理任务句柄
    handler_task: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for ConfigEventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEventHandler")
            .field("is_running", &self.is_running)
            .finish_non_exhaustive()
    }
}

impl ConfigEventHandler {
    /// 创建新的配置事件处理器
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 使用指定通道容量创建事件处理器
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        Self {
            listeners: Arc::new(RwLock::new(HashMap::new())),
            event_sender: sender,
            event_receiver: Some(receiver),
            is_running: false,
            handler_task: None,
        }
    }

    /// 注册事件监听器，同名监听器会被替换
    pub async fn register_listener(&self, listener: Arc<dyn ConfigListener>) {
        info!("注册配置事件监听器: {}", listener.name());

        let mut listeners = self.listeners.write().await;
        listeners.insert(listener.name().to_string(), listener);
    }

    /// 移除事件监听器，返回是否确实移除
    pub async fn unregister_listener(&self, listener_name: &str) -> bool {
        info!("移除配置事件监听器: {}", listener_name);

        let mut listeners = self.listeners.write().await;
        listeners.remove(listener_name).is_some()
    }

    /// 发送配置变更事件
    pub async fn send_event(&self, event: ConfigChangeEvent) -> Result<(), ConfigError> {
        debug!("发送配置变更事件: {:?}", event.event_type);

        self.event_sender
            .send(event)
            .await
            .map_err(|e| ConfigError::event_dispatch(format!("发送事件失败: {}", e)))
    }

    /// 创建可注册到配置上的转发监听器
    ///
    /// 转发器不会阻塞变更线程：通道已满时事件被丢弃并记录警告
    pub fn forwarder(&self) -> Arc<dyn ConfigListener> {
        Arc::new(EventForwarder {
            sender: self.event_sender.clone(),
        })
    }

    /// 启动事件处理器
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if self.is_running {
            return Ok(());
        }

        info!("启动配置事件处理器");

        let listeners = self.listeners.clone();
        let mut receiver = self
            .event_receiver
            .take()
            .ok_or_else(|| ConfigError::event_dispatch("事件接收器不可用"))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                ConfigEventHandler::dispatch_event(&listeners, &event).await;
            }
        });

        self.handler_task = Some(handle);
        self.is_running = true;

        info!("配置事件处理器已启动");
        Ok(())
    }

    /// 停止事件处理器
    pub fn stop(&mut self) {
        if !self.is_running {
            return;
        }

        info!("停止配置事件处理器");

        if let Some(handle) = self.handler_task.take() {
            handle.abort();
        }

        self.is_running = false;

        info!("配置事件处理器已停止");
    }

    /// 分发事件到监听器
    async fn dispatch_event(
        listeners: &Arc<RwLock<HashMap<String, Arc<dyn ConfigListener>>>>,
        event: &ConfigChangeEvent,
    ) {
        let snapshot: Vec<(String, Arc<dyn ConfigListener>)> = listeners
            .read()
            .await
            .iter()
            .map(|(name, listener)| (name.clone(), listener.clone()))
            .collect();

        for (name, listener) in snapshot {
            debug!("向监听器 {} 分发事件: {:?}", name, event.event_type);
            listener.on_config_changed(event);
        }
    }

    /// 获取监听器数量
    pub async fn get_listener_count(&self) -> usize {
        let listeners = self.listeners.read().await;
        listeners.len()
    }

    /// 获取所有监听器名称
    pub async fn get_listener_names(&self) -> Vec<String> {
        let listeners = self.listeners.read().await;
        listeners.keys().cloned().collect()
    }

    /// 是否正在运行
    pub fn is_running(&self) -> bool {
        self.is_running
    }
}

impl Default for ConfigEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfigEventHandler {
    fn drop(&mut self) {
        if let Some(handle) = self.handler_task.take() {
            handle.abort();
        }
    }
}

struct EventForwarder {
    sender: mpsc::Sender<ConfigChangeEvent>,
}

impl ConfigListener for EventForwarder {
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!("配置事件通道已满，丢弃事件: {:?} from {}", dropped.event_type, dropped.source);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("配置事件通道已关闭");
            }
        }
    }

    fn name(&self) -> &str {
        "EventForwarder"
    }
}

/// 日志记录事件监听器
///
/// 将所有配置变更事件记录到日志中
#[derive(Debug, Clone)]
pub struct LoggingConfigListener {
    name: String,
}

impl LoggingConfigListener {
    /// 创建新的日志记录监听器
    pub fn new() -> Self {
        Self {
            name: "LoggingConfigListener".to_string(),
        }
    }
}

impl Default for LoggingConfigListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigListener for LoggingConfigListener {
    fn on_config_changed(&self, event: &ConfigChangeEvent) {
        let key = event.key.as_deref().unwrap_or("*");
        match event.event_type {
            ConfigChangeEventType::Created => {
                info!("配置创建: {} ({}) at {}", key, event.source, event.timestamp);
            }
            ConfigChangeEventType::Updated => {
                info!("配置更新: {} ({}) at {}", key, event.source, event.timestamp);
            }
            ConfigChangeEventType::Deleted => {
                warn!("配置删除: {} ({}) at {}", key, event.source, event.timestamp);
            }
            ConfigChangeEventType::Reloaded => {
                info!("配置重载: {} at {}", event.source, event.timestamp);
            }
            ConfigChangeEventType::LayerAdded
            | ConfigChangeEventType::LayerRemoved
            | ConfigChangeEventType::LayerReplaced
            | ConfigChangeEventType::LayersReordered => {
                info!("配置层变更: {:?} {} at {}", event.event_type, event.source, event.timestamp);
            }
        }

        if !event.metadata.is_empty() {
            debug!("事件元数据: {:?}", event.metadata);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
