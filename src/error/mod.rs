//! Error handling module for nodescout
//!
//! This module provides the crate-wide error type and result alias.

mod error;

pub use error::{Result, ScoutError};
