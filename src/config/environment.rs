//! Environment variable integration for nodescout configuration

use crate::config::Config;
use crate::error::{Result, ScoutError};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Environment variable names used by nodescout
pub struct EnvVars;

impl EnvVars {
    pub const ENVIRONMENT: &'static str = "NODESCOUT_ENV";
    pub const CONFIG_PATH: &'static str = "NODESCOUT_CONFIG_PATH";
    pub const API_URL: &'static str = "NODESCOUT_API_URL";
    pub const API_KEY: &'static str = "NODESCOUT_API_KEY";
    pub const BATCH_SIZE: &'static str = "NODESCOUT_BATCH_SIZE";
    pub const CONCURRENCY: &'static str = "NODESCOUT_CONCURRENCY";
    pub const CACHE_MAX_SIZE: &'static str = "NODESCOUT_CACHE_MAX_SIZE";
    pub const CACHE_TTL_SECS: &'static str = "NODESCOUT_CACHE_TTL_SECS";
    pub const SCORE_THRESHOLD: &'static str = "NODESCOUT_SCORE_THRESHOLD";
    pub const LOG_LEVEL: &'static str = "NODESCOUT_LOG_LEVEL";
}

/// Environment configuration overrides
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOverrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub batch_size: Option<usize>,
    pub concurrency: Option<usize>,
    pub cache_max_size: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub score_threshold: Option<f64>,
    pub log_level: Option<String>,
}

impl EnvironmentOverrides {
    /// Load overrides from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load overrides through a variable lookup function. Empty values are ignored;
    /// values that fail to parse are a configuration error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let overrides = Self {
            config_path: get(EnvVars::CONFIG_PATH).map(PathBuf::from),
            api_url: get(EnvVars::API_URL),
            api_key: get(EnvVars::API_KEY),
            batch_size: parse_var(EnvVars::BATCH_SIZE, get(EnvVars::BATCH_SIZE))?,
            concurrency: parse_var(EnvVars::CONCURRENCY, get(EnvVars::CONCURRENCY))?,
            cache_max_size: parse_var(EnvVars::CACHE_MAX_SIZE, get(EnvVars::CACHE_MAX_SIZE))?,
            cache_ttl_secs: parse_var(EnvVars::CACHE_TTL_SECS, get(EnvVars::CACHE_TTL_SECS))?,
            score_threshold: parse_var(EnvVars::SCORE_THRESHOLD, get(EnvVars::SCORE_THRESHOLD))?,
            log_level: get(EnvVars::LOG_LEVEL),
        };

        if overrides.api_key.is_some() {
            debug!("Environment override: {}=<redacted>", EnvVars::API_KEY);
        }
        Ok(overrides)
    }

    /// Apply the overrides on top of file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.api_url {
            debug!("Environment override: {}={}", EnvVars::API_URL, url);
            config.remote.base_url = url.clone();
        }
        if let Some(ref key) = self.api_key {
            config.remote.api_key = Some(key.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.discovery.batch.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.discovery.batch.concurrency = concurrency;
        }
        if let Some(max_size) = self.cache_max_size {
            config.cache.max_size = max_size;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache.default_ttl = Duration::from_secs(ttl);
        }
        if let Some(threshold) = self.score_threshold {
            config.selector.score_threshold = threshold;
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn parse_var<T>(name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ScoutError::config(format!("Invalid {} environment variable '{}': {}", name, raw, e))),
        None => Ok(None),
    }
}
