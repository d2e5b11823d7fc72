use crate::camera::ModelFailurePolicy;
use anyhow::{ensure, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub tracker: TrackerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Where the progress sampler POSTs readings
    pub tracking_endpoint: String,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
    #[serde(default = "default_emotion_interval")]
    pub emotion_interval_secs: u64,
    #[serde(default = "default_close_threshold")]
    pub close_threshold_percent: f64,
    #[serde(default)]
    pub model_failure_policy: ModelFailurePolicy,
}

fn default_progress_interval() -> u64 {
    5
}

fn default_emotion_interval() -> u64 {
    2
}

fn default_close_threshold() -> f64 {
    90.0
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("WEESEE").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.tracker
            .validate()
            .with_context(|| format!("Invalid [tracker] section in {}", path))?;

        Ok(cfg)
    }
}

impl TrackerConfig {
    /// Reject settings the samplers cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.progress_interval_secs > 0,
            "progress_interval_secs must be at least 1"
        );
        ensure!(
            self.emotion_interval_secs > 0,
            "emotion_interval_secs must be at least 1"
        );
        ensure!(
            self.close_threshold_percent.is_finite(),
            "close_threshold_percent must be a number"
        );
        Ok(())
    }
}
