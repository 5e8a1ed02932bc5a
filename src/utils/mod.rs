//! Shared utilities for nodescout
//!
//! Small helpers used across the discovery, cache and selector modules.

pub mod periodic;
pub mod serde_duration;

pub use periodic::PeriodicTask;
pub use serde_duration::{duration_millis, duration_secs};
