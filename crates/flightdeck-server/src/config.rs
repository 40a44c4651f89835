use flightdeck_core::config::{AuthConfig, CleanupConfig, ConfigError};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8000"
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path to the local SQLite file backing the user store.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_sqlite_path() -> String {
    "data/flightdeck.sqlite".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl AppConfig {
    /// Validate every bounded setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()?;
        self.cleanup.validate()?;
        Ok(())
    }
}

/// Load configuration from the TOML file, falling back to defaults when the
/// file does not exist.
pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_path();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file found, using defaults");
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    let cfg: AppConfig = toml::from_str(&raw)?;
    Ok(cfg)
}

fn config_path() -> PathBuf {
    if let Ok(p) = env::var("FLIGHTDECK_CONFIG") {
        return PathBuf::from(p);
    }
    PathBuf::from("config.toml")
}
