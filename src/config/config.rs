use crate::cache::CacheConfig;
use crate::config::environment::{EnvVars, EnvironmentOverrides};
use crate::discovery::{DiscoveryConfig, RegistryConfig, RemoteConfig};
use crate::error::{Result, ScoutError};
use crate::selector::SelectorConfig;
use crate::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file used when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "nodescout.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote automation platform
    pub remote: RemoteConfig,
    /// Package registry used for community discovery
    pub registry: RegistryConfig,
    pub discovery: DiscoveryConfig,
    pub cache: CacheConfig,
    pub selector: SelectorConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text, json, pretty)
    pub format: String,
    /// Log file path (optional)
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        const FORMATS: &[&str] = &["text", "json", "pretty"];

        if !LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ScoutError::config(format!(
                "Invalid log level '{}' (valid: {})",
                self.level,
                LEVELS.join(", ")
            )));
        }
        if !FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ScoutError::config(format!(
                "Invalid log format '{}' (valid: {})",
                self.format,
                FORMATS.join(", ")
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load .env files in order of precedence
    fn load_env_files() {
        let env = std::env::var(EnvVars::ENVIRONMENT).unwrap_or_else(|_| "development".to_string());

        let env_specific_file = format!(".env.{}", env);
        let env_files = [".env", env_specific_file.as_str(), ".env.local"];

        for env_file in env_files {
            match dotenvy::from_filename(env_file) {
                Ok(_) => tracing::info!("Loaded environment variables from {}", env_file),
                Err(e) if e.not_found() => tracing::debug!("No {} file found, skipping", env_file),
                Err(e) => tracing::warn!("Failed to load {}: {}", env_file, e),
            }
        }

        tracing::debug!("Environment: {}", env);
    }

    /// Load configuration: `.env` files, then the YAML file, then environment
    /// overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_env_files();
        let overrides = EnvironmentOverrides::load()?;

        let path: PathBuf = path
            .map(Path::to_path_buf)
            .or_else(|| overrides.config_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ScoutError::config(format!("Failed to read config file {}: {}", path.display(), e)))?;
            Self::from_yaml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        overrides.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without validating
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ScoutError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.remote.validate()?;
        self.registry.validate()?;
        self.discovery.validate()?;
        self.cache.validate()?;
        self.selector.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
