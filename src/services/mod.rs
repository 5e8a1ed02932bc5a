//! Service composition
//!
//! [`ScoutService`] owns the discovery engine, the adaptive cache and the tool
//! selector, and gives them an explicit start/stop lifecycle.

pub mod scout;

pub use scout::{selection_key, ScoutService};
