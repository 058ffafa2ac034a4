//! Centralized integration tests for the configuration engine
use config_abstractions::{
    CascadePrecedence, Config, ConfigChangeEvent, ConfigExt, Property, PropertyListener,
};
use config_impl::{
    CompositeConfig, ConcatCascadeStrategy, ConfigEventHandler, ConfigurationProvisioner,
    ConfigurationSource, DefaultConfigLoader, DefaultSettableConfig, DimensionCascadeStrategy,
    EngineSettings, FileResourceFetcher, LayeredConfig, MapConfig, StringInterpolator,
};
use infrastructure_common::{ConfigError, Configurable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// 写入 app / app-dev-us 两个资源，app-dev 缺失
fn resource_dir() -> anyhow::Result<TempDir> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("app.toml"),
        "level = \"app\"\nbase_only = true\n\n[server]\nport = 8080\n",
    )?;
    fs::write(
        dir.path().join("app-dev-us.json"),
        r#"{"level": "app-dev-us", "server": {"port": 9443}}"#,
    )?;
    Ok(dir)
}

fn lookup() -> Arc<dyn Config> {
    Arc::new(
        MapConfig::builder()
            .put("env", "dev")
            .put("region", "us")
            .build(),
    )
}

#[test]
fn test_cascade_most_specific_wins() -> anyhow::Result<()> {
    let dir = resource_dir()?;
    let loader = DefaultConfigLoader::new(Arc::new(FileResourceFetcher::new(dir.path())), lookup());

    let config = loader
        .new_loader()
        .with_cascade_strategy(Arc::new(ConcatCascadeStrategy::new([
            "${env}",
            "${env}-${region}",
        ])))
        .load("app")?;

    assert_eq!(config.config_names(), vec!["app-dev-us", "app"]);
    assert_eq!(config.get_string("level")?, "app-dev-us");
    assert_eq!(config.get::<u16>("server.port")?, 9443);
    assert!(config.get_bool("base_only")?);
    Ok(())
}

#[test]
fn test_cascade_least_specific_wins_when_configured() -> anyhow::Result<()> {
    let dir = resource_dir()?;
    let loader = DefaultConfigLoader::new(Arc::new(FileResourceFetcher::new(dir.path())), lookup());

    let config = loader
        .new_loader()
        .with_cascade_strategy(Arc::new(DimensionCascadeStrategy::new(["env", "region"])))
        .with_precedence(CascadePrecedence::LeastSpecificFirst)
        .load("app")?;

    assert_eq!(config.config_names(), vec!["app", "app-dev-us"]);
    assert_eq!(config.get_string("level")?, "app");
    Ok(())
}

#[test]
fn test_missing_base_resource() -> anyhow::Result<()> {
    let dir = resource_dir()?;
    let loader = DefaultConfigLoader::new(Arc::new(FileResourceFetcher::new(dir.path())), lookup());
    match loader.load("absent") {
        Err(ConfigError::ResourceLoad { resource, .. }) => assert_eq!(resource, "absent"),
        other => panic!("unexpected result: {:?}", other.map(|c| c.config_names())),
    }
    Ok(())
}

#[test]
fn test_first_match_wins_and_interpolation() {
    let composite = CompositeConfig::new("root");
    composite
        .add_config("first", Arc::new(MapConfig::builder().put("a", "x").build()))
        .unwrap();
    composite
        .add_config(
            "second",
            Arc::new(
                MapConfig::builder()
                    .put("a", "ignored")
                    .put("b", "y")
                    .put("ab", "${a}-${b}")
                    .put("partial", "${a}-${missing}")
                    .build(),
            ),
        )
        .unwrap();

    assert_eq!(composite.get_string("ab").unwrap(), "x-y");
    assert_eq!(composite.get_string("partial").unwrap(), "x-${missing}");

    let strict = StringInterpolator::strict();
    let lookup = |key: &str| composite.lookup(key);
    assert!(matches!(
        strict.resolve("${missing}", &lookup),
        Err(ConfigError::UnresolvedPlaceholder { .. })
    ));
}

#[test]
fn test_property_fan_out_through_layers() {
    let layered = LayeredConfig::new().unwrap();
    layered.runtime().set_property("limit", 10);
    let limit = layered.property_factory().get_property("limit").as_type(0_i32);

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    for counter in [first.clone(), second.clone()] {
        limit.add_listener(Arc::new(move |value: &i32| {
            assert_eq!(*value, 20);
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    layered.runtime().set_property("limit", 20);
    assert_eq!(limit.get(), 20);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);

    limit.unsubscribe();
    layered.runtime().set_property("limit", 30);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(limit.get(), 20);
}

#[test]
fn test_property_error_signal() {
    struct ErrorCounter(AtomicUsize);

    impl PropertyListener<u16> for ErrorCounter {
        fn on_change(&self, _value: &u16) {}

        fn on_error(&self, _error: &ConfigError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let runtime = Arc::new(DefaultSettableConfig::new("runtime"));
    runtime.set_property("port", 80);
    let port = config_impl::DefaultPropertyFactory::new(runtime.clone())
        .get_property("port")
        .as_type(0_u16);
    let errors = Arc::new(ErrorCounter(AtomicUsize::new(0)));
    port.add_listener(errors.clone());

    runtime.set_property("port", 70_000);
    assert_eq!(port.get(), 80);
    assert_eq!(errors.0.load(Ordering::SeqCst), 1);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct CacheConfig {
    capacity: usize,
    ttl_seconds: u64,
}

#[derive(Debug, Default)]
struct Cache {
    config: CacheConfig,
}

impl Configurable for Cache {
    type Config = CacheConfig;

    fn configure(&mut self, config: Self::Config) -> Result<(), ConfigError> {
        self.config = config;
        Ok(())
    }

    fn get_config_path() -> &'static str {
        "cache"
    }
}

#[test]
fn test_provisioning_binds_from_files() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("cache.toml"), "[cache]\ncapacity = 128\nttl_seconds = 60\n")?;
    fs::write(dir.path().join("cache-prod.toml"), "[cache]\nttl_seconds = 5\n")?;

    let layered = LayeredConfig::new()?;
    layered.defaults().set_property("env", "prod");
    let provisioner = ConfigurationProvisioner::new(
        layered.clone(),
        Arc::new(FileResourceFetcher::new(dir.path())),
        &EngineSettings::default(),
    );

    let mut cache = Cache::default();
    let source = ConfigurationSource::new(["cache"])
        .with_cascade_strategy(Arc::new(ConcatCascadeStrategy::new(["${env}"])));
    provisioner.on_provision(&mut cache, &source)?;

    assert_eq!(cache.config.capacity, 128);
    assert_eq!(cache.config.ttl_seconds, 5);

    layered.runtime().set_property("cache.capacity", "256");
    provisioner.on_provision(&mut cache, &source)?;
    assert_eq!(cache.config.capacity, 256);
    assert_eq!(layered.libraries().layer_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_async_dispatch_receives_layer_events() -> anyhow::Result<()> {
    let layered = LayeredConfig::new()?;
    let mut handler = ConfigEventHandler::new();

    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel::<ConfigChangeEvent>();
    handler
        .register_listener(Arc::new(move |event: &ConfigChangeEvent| {
            let _ = sender.send(event.clone());
        }))
        .await;
    handler.start()?;
    layered.root().add_listener(handler.forwarder());

    layered.runtime().set_property("feature.enabled", true);
    let event = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await?
        .expect("事件通道已关闭");
    assert_eq!(event.key.as_deref(), Some("feature.enabled"));
    assert_eq!(event.source, "runtime/runtime");

    handler.stop();
    Ok(())
}
