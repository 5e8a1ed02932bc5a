//! nodescout - capability discovery and tool selection for n8n
//!
//! This crate probes a running n8n instance for the node types it exposes,
//! caches the results with adaptive expiry, and selects a bounded,
//! relevance-ranked subset of capabilities for a calling agent.

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod selector;
pub mod services;
pub mod startup;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{Result, ScoutError};
pub use services::ScoutService;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
