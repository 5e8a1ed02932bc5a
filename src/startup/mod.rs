//! Startup helpers: logging initialization and the configuration summary

pub mod logger;

pub use logger::{init_logging, StartupLogger};
