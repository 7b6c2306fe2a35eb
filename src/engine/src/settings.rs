use config::{Config, ConfigError, File};
use postgres::PsqlSettings;
use serde::Deserialize;
use std::time::Duration;
use strum::{AsRefStr, EnumString};
use trawlwatch_core::{SegmentationConfig, TaskName};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub postgres: PsqlSettings,
    pub engine: EngineSettings,
    /// Only runs the given stage, the default runs every stage in order.
    pub single_stage_run: Option<TaskName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub num_workers: u32,
    /// Upper bound on the span of position ingestion time a single segmentation run covers.
    #[serde(with = "humantime_serde")]
    pub batch_window: Duration,
    pub aggregation_batch_size: u32,
    #[serde(with = "humantime_serde")]
    pub spatial_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub in_flight_stale_after: Duration,
    pub lookup_concurrency: usize,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    Local,
    Development,
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT")
            .map_err(|e| ConfigError::Message(format!("APP_ENVIRONMENT is not set: {e}")))?;
        let environment: Environment = environment.parse().map_err(|_| {
            ConfigError::Message(format!("invalid APP_ENVIRONMENT '{environment}'"))
        })?;

        Config::builder()
            .add_source(File::with_name(&format!("config/{}", environment.as_ref())).required(true))
            .add_source(config::Environment::with_prefix("TRAWLWATCH_ENGINE").separator("__"))
            .set_override("environment", environment.as_ref())?
            .build()?
            .try_deserialize()
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            num_workers: 4,
            batch_window: Duration::from_secs(6 * 3600),
            aggregation_batch_size: 10_000,
            spatial_timeout: Duration::from_secs(10),
            in_flight_stale_after: Duration::from_secs(3600),
            lookup_concurrency: 8,
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
