//! Logging setup and startup summary

use crate::config::{Config, LoggingConfig};
use crate::error::{Result, ScoutError};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level; output goes to stderr unless a log file is configured.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let fmt_layer = match config.format.to_lowercase().as_str() {
        "json" => fmt::layer().json().with_writer(writer).boxed(),
        "pretty" => fmt::layer().pretty().with_writer(writer).boxed(),
        _ => fmt::layer()
            .with_target(false)
            .with_line_number(true)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| ScoutError::config(format!("Failed to initialize logging: {}", e)))
}

/// Startup logger for configuration summaries
pub struct StartupLogger;

impl StartupLogger {
    /// Log the effective configuration at startup
    pub fn display_startup_info(config: &Config, config_path: Option<&Path>, version: &str) {
        info!("🚀 nodescout v{} starting...", version);

        match config_path {
            Some(path) if path.exists() => info!("📁 Config file: {} ✅", path.display()),
            Some(path) => info!("📁 Config file: {} (not found, using defaults)", path.display()),
            None => info!("📁 Config file: built-in defaults"),
        }

        info!("🌐 Remote host: {}", config.remote.base_url);
        if config.remote.api_key.is_none() {
            warn!("   ⚠️  No API key configured; the remote host may reject requests");
        }

        let batch = &config.discovery.batch;
        info!(
            "🔍 Discovery: batch size {}, {} concurrent batches, {}ms between windows, sample {}",
            batch.batch_size,
            batch.concurrency,
            batch.inter_window_delay.as_millis(),
            config.discovery.sample_size
        );

        let sources: Vec<&str> = [
            (config.discovery.include_catalog, "catalog"),
            (config.discovery.include_patterns, "patterns"),
            (config.discovery.include_workflows, "workflows"),
            (config.discovery.include_registry && config.registry.enabled, "registry"),
        ]
        .iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, name)| *name)
        .collect();
        info!("   Candidate sources: {}", sources.join(", "));

        info!(
            "💾 Cache: max {} entries, default TTL {}s, cleanup every {}s",
            config.cache.max_size,
            config.cache.default_ttl.as_secs(),
            config.cache.cleanup_interval.as_secs()
        );

        info!(
            "🎯 Selector: threshold {:.2}, count range [{}, {}], priority fallback {}",
            config.selector.score_threshold,
            config.selector.min_count,
            config.selector.max_count,
            if config.selector.fallback_to_top_priority { "on" } else { "off" }
        );

        info!("🗄️  Store: {:?}", config.store.kind);
    }
}
