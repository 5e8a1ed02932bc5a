//! Types for tool selection

use crate::discovery::catalog;
use crate::discovery::{CapabilityDescriptor, CapabilityOrigin, ResourceCost};
use crate::error::{Result, ScoutError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-declared purpose of a selection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Discovery,
    Execution,
    Validation,
    Analysis,
    Troubleshooting,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Discovery => "discovery",
            Intent::Execution => "execution",
            Intent::Validation => "validation",
            Intent::Analysis => "analysis",
            Intent::Troubleshooting => "troubleshooting",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "discovery" => Ok(Intent::Discovery),
            "execution" => Ok(Intent::Execution),
            "validation" => Ok(Intent::Validation),
            "analysis" => Ok(Intent::Analysis),
            "troubleshooting" => Ok(Intent::Troubleshooting),
            other => Err(ScoutError::selection(format!("Unknown intent '{}'", other))),
        }
    }
}

/// A selection request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolContext {
    /// Free-text query
    pub query: Option<String>,
    /// Category filter; matching capabilities get a bonus
    pub category: Option<String>,
    pub intent: Option<Intent>,
    /// Node types the caller already knows are relevant
    pub relevant_node_types: Vec<String>,
    /// The request happens while editing a workflow
    pub workflow_context: bool,
    /// Capabilities used earlier in the session
    pub previous_tools: Vec<String>,
    /// Explicit maximum number of items
    pub max_tools: Option<usize>,
    /// Explicit score threshold
    pub score_threshold: Option<f64>,
}

impl ToolContext {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Lowercased query terms longer than two characters
    pub fn query_terms(&self) -> Vec<String> {
        self.query
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|term| term.len() > 2)
            .map(str::to_lowercase)
            .collect()
    }

    pub fn query_word_count(&self) -> usize {
        self.query
            .as_deref()
            .map(|q| q.split_whitespace().count())
            .unwrap_or(0)
    }
}

/// The selector's view of a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectableCapability {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Base priority 0-100
    pub priority: u8,
    /// Found at runtime rather than known ahead of time
    pub dynamic: bool,
    pub cost: ResourceCost,
}

impl SelectableCapability {
    /// Build from a descriptor, taking priority and cost from the catalog when known
    pub fn from_descriptor(descriptor: &CapabilityDescriptor) -> Self {
        let entry = match descriptor.origin {
            CapabilityOrigin::Standard => catalog::lookup(&descriptor.id),
            _ => None,
        };

        let priority = entry.map(|e| e.priority).unwrap_or(match descriptor.origin {
            CapabilityOrigin::Standard => 50,
            CapabilityOrigin::Community => 40,
            CapabilityOrigin::Custom => 30,
        });

        Self {
            id: descriptor.id.clone(),
            title: descriptor.display_name.clone(),
            description: descriptor.description.clone(),
            category: descriptor.category.clone(),
            priority,
            dynamic: entry.is_none(),
            cost: entry.map(|e| e.cost).unwrap_or_default(),
        }
    }
}

/// Score of one capability against a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRelevanceScore {
    pub capability_id: String,
    /// Normalized score in [0, 1]
    pub score: f64,
    pub reasons: Vec<String>,
    pub category: String,
    /// Context-match component, normalized to [0, 1]
    pub context_match: f64,
    /// Usage-frequency component, normalized to [0, 1]
    pub usage_frequency: f64,
    /// Success-rate component, normalized to [0, 1]
    pub success_rate: f64,
}

/// Result of a selection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected capability ids, best first
    pub items: Vec<String>,
    /// Scores of the selected items, same order
    pub scores: Vec<ToolRelevanceScore>,
    /// Sum of the selected scores
    pub total_score: f64,
    pub reasoning: String,
    /// Items were chosen by raw priority because nothing cleared the threshold
    pub fallback_used: bool,
}

impl Selection {
    pub fn empty(reasoning: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            scores: Vec::new(),
            total_score: 0.0,
            reasoning: reasoning.into(),
            fallback_used: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Invocation history of one capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStat {
    pub capability_id: String,
    pub call_count: u64,
    pub success_count: u64,
    pub last_used: DateTime<Utc>,
}

impl UsageStat {
    pub fn new(capability_id: impl Into<String>) -> Self {
        Self {
            capability_id: capability_id.into(),
            call_count: 0,
            success_count: 0,
            last_used: Utc::now(),
        }
    }

    pub fn success_rate(&self) -> Option<f64> {
        if self.call_count == 0 {
            None
        } else {
            Some(self.success_count as f64 / self.call_count as f64)
        }
    }
}

/// Tool selector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Minimum normalized score for an item to be selected
    pub score_threshold: f64,
    pub min_count: usize,
    pub max_count: usize,
    /// Usage stats kept before least-recently-used pruning
    pub max_tracked_capabilities: usize,
    /// Learned capability ids kept per intent
    pub max_patterns_per_intent: usize,
    /// Return the top `min_count` by priority when nothing clears the threshold
    pub fallback_to_top_priority: bool,
    /// Recency decay constant for usage frequency, in hours
    pub usage_decay_hours: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.3,
            min_count: 5,
            max_count: 20,
            max_tracked_capabilities: 1000,
            max_patterns_per_intent: 50,
            fallback_to_top_priority: false,
            usage_decay_hours: 24.0,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ScoutError::config("Selector score_threshold must be within [0, 1]"));
        }
        if self.min_count == 0 || self.min_count > self.max_count {
            return Err(ScoutError::config(format!(
                "Selector count range [{}, {}] is invalid",
                self.min_count, self.max_count
            )));
        }
        if self.max_tracked_capabilities == 0 {
            return Err(ScoutError::config("Selector max_tracked_capabilities must be greater than zero"));
        }
        if self.usage_decay_hours <= 0.0 {
            return Err(ScoutError::config("Selector usage_decay_hours must be positive"));
        }
        Ok(())
    }
}
