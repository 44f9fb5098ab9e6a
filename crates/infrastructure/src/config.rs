use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use domain::aggregate::{DEFAULT_WINDOW_SIZE, HistoryConfig, HistoryMode, KindFilter};
use domain::{DomainError, OverlapPolicy, WriteMode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://68bb0de484055bce63f104b3.mockapi.io/api/v1/Proyecto1";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PollSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub overlap: OverlapPolicy,
}

fn default_interval_ms() -> u64 {
    2000
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            overlap: OverlapPolicy::default(),
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ViewSettings {
    #[serde(default)]
    pub kind_filter: KindFilter,
    #[serde(default)]
    pub history_mode: HistoryMode,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            kind_filter: KindFilter::default(),
            history_mode: HistoryMode::default(),
            window_size: default_window_size(),
        }
    }
}

impl ViewSettings {
    pub fn history(&self) -> Result<HistoryConfig, DomainError> {
        HistoryConfig::new(self.history_mode, self.window_size)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CommandSettings {
    #[serde(default)]
    pub write_mode: WriteMode,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub commands: CommandSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

impl DashboardConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // 3. Local config file, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // 2. Run-mode specific overrides, e.g. config/production.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // 1. Environment variables (e.g. FLEET__STORE__BASE_URL=http://localhost:8080/devices)
            .add_source(Environment::with_prefix("FLEET").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Reject settings the dashboard cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.store.base_url.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "store.base_url cannot be empty".to_string(),
            ));
        }
        if self.poll.interval_ms == 0 {
            return Err(DomainError::InvalidConfiguration(
                "poll.interval_ms must be greater than zero".to_string(),
            ));
        }
        self.view.history()?;
        Ok(())
    }
}
