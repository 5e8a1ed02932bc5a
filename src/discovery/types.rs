//! Types for capability discovery
//!
//! This module defines the descriptors produced by the discovery engine, the
//! candidate identifiers fed into it, its configuration, and run statistics.

use crate::error::{Result, ScoutError};
use crate::utils::duration_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Where a capability comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityOrigin {
    /// Built into the platform (standard namespaces)
    Standard,
    /// Third-party package with its own namespace
    Community,
    /// No recognizable namespace
    Custom,
}

impl fmt::Display for CapabilityOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityOrigin::Standard => write!(f, "standard"),
            CapabilityOrigin::Community => write!(f, "community"),
            CapabilityOrigin::Custom => write!(f, "custom"),
        }
    }
}

/// Rough execution cost of a capability, used by the selector's efficiency bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResourceCost {
    Low,
    #[default]
    Medium,
    High,
}

/// A discovered integration unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Canonical identifier (standard namespace prefix stripped)
    pub id: String,
    /// Full identifier as accepted by the remote host
    pub node_type: String,
    /// Human-readable name
    pub display_name: String,
    /// Free-text description
    pub description: String,
    /// Category label
    pub category: String,
    /// Origin classification
    pub origin: CapabilityOrigin,
    /// Package that provides this capability
    pub package_name: Option<String>,
    /// Package version, when known
    pub package_version: Option<String>,
    /// Credential type this capability authenticates with
    pub credential_type: Option<String>,
    /// Raw parameter schema, opaque to discovery
    #[serde(default)]
    pub schema: serde_json::Value,
    /// When this capability was discovered
    pub discovered_at: DateTime<Utc>,
    /// Whether the remote host accepted this capability
    pub validated: bool,
}

/// How a candidate identifier was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Supplied directly by the caller
    Seed,
    /// Static catalog of well-known nodes
    Catalog,
    /// Generated from name fragments and namespace prefixes
    Pattern,
    /// Extracted from existing workflows on the remote host
    Workflow,
    /// Found through a package registry search
    Registry,
}

/// A capability identifier to probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Identifier submitted to the remote host
    pub node_type: String,
    /// Canonical identifier used for deduplication
    pub canonical_id: String,
    /// Where the candidate came from
    pub source: CandidateSource,
    /// Package version, when the source knows it
    pub package_version: Option<String>,
}

impl Candidate {
    /// Create a candidate from a raw identifier
    pub fn new(node_type: impl Into<String>, source: CandidateSource) -> Self {
        let node_type = node_type.into().trim().to_string();
        let canonical_id = crate::discovery::canonical::canonical_id(&node_type);
        Self {
            node_type,
            canonical_id,
            source,
            package_version: None,
        }
    }

    /// Attach a package version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.package_version = Some(version.into());
        self
    }

    /// Whether the identifier carries a namespace
    pub fn is_namespaced(&self) -> bool {
        self.node_type.contains('.')
    }
}

impl From<&str> for Candidate {
    fn from(node_type: &str) -> Self {
        Candidate::new(node_type, CandidateSource::Seed)
    }
}

impl From<String> for Candidate {
    fn from(node_type: String) -> Self {
        Candidate::new(node_type, CandidateSource::Seed)
    }
}

/// Result of one validation request against the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The host accepted the artifact; it should be deleted afterwards
    Accepted { artifact_id: Option<String> },
    /// The host rejected the artifact (not found / validation failure)
    Rejected { reason: String },
}

impl ProbeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProbeOutcome::Accepted { .. })
    }
}

/// Batch scheduling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Candidates per combined validation request
    pub batch_size: usize,
    /// Batches executed concurrently per window
    pub concurrency: usize,
    /// Pause between windows
    #[serde(with = "duration_millis")]
    pub inter_window_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 3,
            inter_window_delay: Duration::from_millis(500),
        }
    }
}

impl BatchConfig {
    /// Validate batch configuration
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ScoutError::config("Discovery batch size must be greater than zero"));
        }
        if self.concurrency == 0 {
            return Err(ScoutError::config("Discovery concurrency must be greater than zero"));
        }
        if self.inter_window_delay > Duration::from_secs(60) {
            return Err(ScoutError::config(
                "Inter-window delay cannot exceed 60 seconds",
            ));
        }
        Ok(())
    }
}

/// Discovery engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Batch scheduling
    pub batch: BatchConfig,
    /// Maximum number of discovered capabilities re-validated individually
    pub sample_size: usize,
    /// Seed candidates from the built-in catalog
    pub include_catalog: bool,
    /// Seed candidates generated from name fragments
    pub include_patterns: bool,
    /// Upper bound on generated pattern candidates
    pub max_pattern_candidates: usize,
    /// Seed candidates from node types used in existing workflows
    pub include_workflows: bool,
    /// Seed candidates from the package registry
    pub include_registry: bool,
    /// Registry keyword identifying community node packages
    pub community_keyword: String,
    /// Maximum number of registry packages to consider
    pub max_registry_packages: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            sample_size: 50,
            include_catalog: true,
            include_patterns: true,
            max_pattern_candidates: 200,
            include_workflows: true,
            include_registry: true,
            community_keyword: "n8n-community-node-package".to_string(),
            max_registry_packages: 50,
        }
    }
}

impl DiscoveryConfig {
    /// Validate discovery configuration
    pub fn validate(&self) -> Result<()> {
        self.batch.validate()?;
        if self.include_registry && self.community_keyword.trim().is_empty() {
            return Err(ScoutError::config(
                "Registry discovery requires a non-empty community keyword",
            ));
        }
        Ok(())
    }
}

/// Statistics for a discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Candidates submitted before deduplication
    pub total_candidates: usize,
    /// Candidates left after canonical deduplication
    pub unique_candidates: usize,
    /// Number of batches scheduled
    pub batches: usize,
    /// Number of windows that ran to completion
    pub windows_completed: usize,
    /// Capabilities discovered
    pub discovered: usize,
    /// Candidates rejected by the remote host
    pub rejected: usize,
    /// Probe or batch failures (transport errors, unexpected statuses)
    pub errors: usize,
    /// Degraded candidate sources and similar non-fatal conditions
    pub warnings: Vec<String>,
    /// Capabilities re-validated individually
    pub sample_size: usize,
    /// Sampled capabilities that passed re-validation
    pub sample_validated: usize,
    /// `sample_validated / sample_size`, or 0 when nothing was sampled
    pub confidence: f64,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// When the run started
    pub started_at: DateTime<Utc>,
}

impl Default for DiscoveryStats {
    fn default() -> Self {
        Self {
            total_candidates: 0,
            unique_candidates: 0,
            batches: 0,
            windows_completed: 0,
            discovered: 0,
            rejected: 0,
            errors: 0,
            warnings: Vec::new(),
            sample_size: 0,
            sample_validated: 0,
            confidence: 0.0,
            cancelled: false,
            duration_ms: 0,
            started_at: Utc::now(),
        }
    }
}

/// Output of a discovery run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Discovered capabilities, ordered by id
    pub descriptors: Vec<CapabilityDescriptor>,
    /// Run statistics
    pub stats: DiscoveryStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_rejects_zero_values() {
        let config = BatchConfig {
            batch_size: 0,
            ..BatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScoutError::Config { .. })));

        let config = BatchConfig {
            concurrency: 0,
            ..BatchConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(BatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_candidate_canonicalization() {
        let candidate: Candidate = "n8n-nodes-base.slack".into();
        assert_eq!(candidate.canonical_id, "slack");
        assert_eq!(candidate.source, CandidateSource::Seed);
        assert!(candidate.is_namespaced());

        let bare: Candidate = " slack ".into();
        assert_eq!(bare.node_type, "slack");
        assert!(!bare.is_namespaced());
    }

    #[test]
    fn test_discovery_config_from_partial_yaml() {
        let config: DiscoveryConfig =
            serde_yaml::from_str("batch:\n  batch_size: 10\n  concurrency: 2\n  inter_window_delay: 0\n").unwrap();
        assert_eq!(config.batch.batch_size, 10);
        assert_eq!(config.sample_size, 50);
        assert!(config.validate().is_ok());
    }
}
