//! Tool Selector
//!
//! Multi-factor relevance scoring and context-aware selection of a bounded
//! subset of capabilities, with feedback from invocation outcomes.

pub mod scoring;
pub mod tool_selector;
pub mod types;

pub use scoring::{score_capability, ScoringSignals, MAX_RAW_SCORE};
pub use tool_selector::{adaptive_count, rank, ToolSelector};
pub use types::*;
