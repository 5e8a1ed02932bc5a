//! Configuration module for nodescout
//!
//! This module provides configuration management and loading utilities.

mod config;
pub mod environment;

pub use config::{Config, LoggingConfig, DEFAULT_CONFIG_FILE};
pub use environment::{EnvVars, EnvironmentOverrides};
