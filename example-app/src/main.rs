//! # 示例应用程序
//!
//! 演示如何使用 Lorn ADSP 分层配置引擎：级联加载、动态属性、运行时覆盖与组件配置供给

use anyhow::Context;
use clap::Parser;
use config_abstractions::{CascadePrecedence, Config, ConfigExt, Property};
use config_impl::{
    ConcatCascadeStrategy, ConfigEventHandler, ConfigurationProvisioner, ConfigurationSource,
    DefaultConfigLoader, EngineSettings, EnvironmentConfig, FileResourceFetcher, LayeredConfig,
    LoggingConfigListener,
};
use infrastructure_common::{ConfigError, Configurable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 配置引擎示例应用")]
struct Args {
    /// 配置资源目录
    #[arg(short, long, default_value = "example-app/config")]
    config_dir: String,

    /// 应用配置资源名
    #[arg(short, long, default_value = "app")]
    resource: String,

    /// 运行环境，用于级联加载 `<资源名>-<环境>`
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// 通用资源优先于环境资源
    #[arg(long)]
    least_specific_first: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 演示结束后等待退出信号
    #[arg(long)]
    wait: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    info!("启动 Lorn ADSP 配置引擎示例应用");

    let mut settings = EngineSettings::from_env().context("加载引擎设置失败")?;
    settings.resource_root = args.config_dir.clone().into();
    if args.least_specific_first {
        settings.cascade_precedence = CascadePrecedence::LeastSpecificFirst;
    }

    let layered = LayeredConfig::builder()
        .settings(settings.clone())
        .with_environment(EnvironmentConfig::with_prefix("ADSP_APP"))
        .build()?;
    layered.defaults().set_property("env", args.env.as_str());

    // 异步事件分发：日志监听器不在变更线程上执行
    let mut events = ConfigEventHandler::new();
    events
        .register_listener(Arc::new(LoggingConfigListener::new()))
        .await;
    events.start()?;
    layered.root().add_listener(events.forwarder());

    let fetcher = Arc::new(FileResourceFetcher::new(&settings.resource_root));
    load_application(&layered, fetcher.clone(), &settings, &args.resource)?;
    demonstrate_properties(&layered)?;
    demonstrate_provisioning(&layered, fetcher, &settings)?;

    // 等待异步监听器输出
    tokio::time::sleep(Duration::from_millis(100)).await;

    if args.wait {
        tokio::signal::ctrl_c().await?;
        info!("收到退出信号，正在关闭应用");
    }

    events.stop();
    info!("应用已关闭");
    Ok(())
}

/// 级联加载应用配置资源
fn load_application(
    layered: &LayeredConfig,
    fetcher: Arc<FileResourceFetcher>,
    settings: &EngineSettings,
    resource: &str,
) -> anyhow::Result<()> {
    info!("加载应用配置资源: {}", resource);

    let loader = DefaultConfigLoader::new(fetcher, layered.as_config()).with_settings(settings);
    let loaded = loader
        .new_loader()
        .with_cascade_strategy(Arc::new(ConcatCascadeStrategy::new(["${env}"])))
        .load(resource)
        .with_context(|| format!("加载配置资源 {} 失败", resource))?;

    info!("已加载的配置层: {:?}", loaded.config_names());
    layered.set_application_config(resource, loaded);
    Ok(())
}

/// 演示动态属性与运行时覆盖
fn demonstrate_properties(layered: &LayeredConfig) -> anyhow::Result<()> {
    info!("演示动态属性");

    let root = layered.root();
    info!("服务地址: {}", root.get_string("server.url")?);

    let factory = layered.property_factory();
    let port = factory.get_property("server.port").as_type(0_u16);
    port.add_listener(Arc::new(|value: &u16| {
        info!("server.port 已变更为 {}", value);
    }));
    info!("当前端口: {}", port.get());

    layered.runtime().set_property("server.port", 7070);
    info!("运行时覆盖后的端口: {}", port.get());
    info!("覆盖后的服务地址: {}", root.get_string("server.url")?);

    layered.runtime().clear_property("server.port");
    info!("清除覆盖后的端口: {}", port.get());
    Ok(())
}

/// 演示组件配置供给
fn demonstrate_provisioning(
    layered: &LayeredConfig,
    fetcher: Arc<FileResourceFetcher>,
    settings: &EngineSettings,
) -> anyhow::Result<()> {
    info!("演示组件配置供给");

    let provisioner = ConfigurationProvisioner::new(layered.clone(), fetcher, settings);
    let mut service = ExampleService::new();
    provisioner.on_provision(&mut service, &ConfigurationSource::new(["example-service"]))?;
    service.do_work();
    Ok(())
}

// 示例组件

/// 示例服务
#[derive(Debug)]
pub struct ExampleService {
    name: String,
    config: Option<ExampleServiceConfig>,
}

impl ExampleService {
    /// 创建新的示例服务
    pub fn new() -> Self {
        Self {
            name: "ExampleService".to_string(),
            config: None,
        }
    }

    /// 执行工作
    pub fn do_work(&self) {
        info!("{} 正在执行工作", self.name);

        if let Some(ref config) = self.config {
            info!("使用配置: {:?}", config);
        } else {
            info!("使用默认配置: {:?}", Self::default_config());
        }
    }
}

/// 示例服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleServiceConfig {
    /// 是否启用
    pub enabled: bool,
    /// 超时时间（秒）
    pub timeout_seconds: u64,
    /// 重试次数
    pub retry_count: u32,
}

impl Default for ExampleServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 30,
            retry_count: 3,
        }
    }
}

impl Configurable for ExampleService {
    type Config = ExampleServiceConfig;

    fn configure(&mut self, config: Self::Config) -> Result<(), ConfigError> {
        info!("配置 ExampleService: {:?}", config);
        self.config = Some(config);
        Ok(())
    }

    fn get_config_path() -> &'static str {
        "services.example_service"
    }
}
