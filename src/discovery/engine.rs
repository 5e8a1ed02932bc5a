//! Discovery engine
//!
//! Probes candidate identifiers against the remote host in fixed-size batches.
//! Batches are grouped into windows; the batches of one window run concurrently
//! under a semaphore, and the next window starts only after the whole window has
//! finished and a short delay has passed. Failures are counted, never propagated.

use crate::discovery::canonical::{self, display_name};
use crate::discovery::catalog;
use crate::discovery::client::RemoteHost;
use crate::discovery::registry::{community_candidates, PackageRegistry};
use crate::discovery::types::{
    BatchConfig, Candidate, CandidateSource, CapabilityDescriptor, DiscoveryConfig, DiscoveryResult,
    DiscoveryStats, ProbeOutcome,
};
use crate::error::Result;
use chrono::Utc;
use futures_util::future;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Candidates gathered from all enabled sources
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Sources that failed and were skipped
    pub warnings: Vec<String>,
}

/// Outcome of probing one batch
#[derive(Debug, Default)]
struct BatchOutcome {
    accepted: Vec<Candidate>,
    rejected: usize,
    errors: usize,
}

enum SingleOutcome {
    Accepted,
    Rejected,
    Failed,
}

/// Concurrent, rate-limited capability discovery
pub struct DiscoveryEngine {
    host: Arc<dyn RemoteHost>,
    registry: Option<Arc<dyn PackageRegistry>>,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    /// Create an engine. Invalid configuration is rejected here, before any probing.
    pub fn new(
        host: Arc<dyn RemoteHost>,
        registry: Option<Arc<dyn PackageRegistry>>,
        config: DiscoveryConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            host,
            registry,
            config,
        })
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Remote host this engine probes
    pub fn host(&self) -> &Arc<dyn RemoteHost> {
        &self.host
    }

    /// Gather candidates from every enabled source. A failing source becomes a warning.
    pub async fn collect_candidates(&self) -> CandidateSet {
        let mut set = CandidateSet::default();

        if self.config.include_catalog {
            let candidates = catalog::catalog_candidates();
            debug!("Catalog contributed {} candidates", candidates.len());
            set.candidates.extend(candidates);
        }

        if self.config.include_patterns {
            let candidates = catalog::generate_pattern_candidates(self.config.max_pattern_candidates);
            debug!("Pattern generation contributed {} candidates", candidates.len());
            set.candidates.extend(candidates);
        }

        if self.config.include_workflows {
            match self.host.list_workflow_node_types().await {
                Ok(node_types) => {
                    debug!("Existing workflows contributed {} candidates", node_types.len());
                    set.candidates.extend(
                        node_types
                            .into_iter()
                            .map(|node_type| Candidate::new(node_type, CandidateSource::Workflow)),
                    );
                }
                Err(e) => {
                    warn!("⚠️  Skipping workflow candidate source: {}", e);
                    set.warnings.push(format!("workflow source unavailable: {}", e));
                }
            }
        }

        if self.config.include_registry {
            match &self.registry {
                Some(registry) => {
                    match registry
                        .search(&self.config.community_keyword, self.config.max_registry_packages)
                        .await
                    {
                        Ok(packages) => {
                            let candidates = community_candidates(&packages);
                            debug!(
                                "Registry contributed {} candidates from {} packages",
                                candidates.len(),
                                packages.len()
                            );
                            set.candidates.extend(candidates);
                        }
                        Err(e) => {
                            warn!("⚠️  Skipping registry candidate source: {}", e);
                            set.warnings.push(format!("registry source unavailable: {}", e));
                        }
                    }
                }
                None => debug!("No package registry configured, skipping community search"),
            }
        }

        set
    }

    /// Collect candidates from all sources and discover them with the configured batching
    pub async fn run(&self, token: CancellationToken) -> Result<DiscoveryResult> {
        let collected = self.collect_candidates().await;
        let mut result = self
            .discover_with_cancel(collected.candidates, &self.config.batch, token)
            .await?;

        let mut warnings = collected.warnings;
        warnings.append(&mut result.stats.warnings);
        result.stats.warnings = warnings;
        Ok(result)
    }

    /// Discover the given candidates. Only an invalid `batch` config is an error.
    pub async fn discover(&self, seeds: Vec<Candidate>, batch: &BatchConfig) -> Result<DiscoveryResult> {
        self.discover_with_cancel(seeds, batch, CancellationToken::new()).await
    }

    /// Discover the given candidates, stopping between windows once `token` is cancelled
    pub async fn discover_with_cancel(
        &self,
        seeds: Vec<Candidate>,
        batch: &BatchConfig,
        token: CancellationToken,
    ) -> Result<DiscoveryResult> {
        batch.validate()?;

        let started = Instant::now();
        let mut stats = DiscoveryStats {
            total_candidates: seeds.len(),
            ..DiscoveryStats::default()
        };

        let (unique, invalid) = dedupe(seeds);
        stats.unique_candidates = unique.len();
        stats.rejected += invalid;

        let batches: Vec<Vec<Candidate>> = unique.chunks(batch.batch_size).map(|c| c.to_vec()).collect();
        let windows: Vec<&[Vec<Candidate>]> = batches.chunks(batch.concurrency).collect();
        stats.batches = batches.len();

        info!(
            "🔍 Discovering {} unique candidates ({} submitted) in {} batches / {} windows",
            stats.unique_candidates,
            stats.total_candidates,
            stats.batches,
            windows.len()
        );

        let semaphore = Arc::new(Semaphore::new(batch.concurrency));
        let mut accepted: Vec<Candidate> = Vec::new();

        for (window_idx, window) in windows.iter().enumerate() {
            if token.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            if window_idx > 0 && !batch.inter_window_delay.is_zero() {
                tokio::select! {
                    _ = token.cancelled() => {
                        stats.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(batch.inter_window_delay) => {}
                }
            }

            let tasks: Vec<_> = window
                .iter()
                .map(|candidates| {
                    let semaphore = Arc::clone(&semaphore);
                    async move {
                        let _permit = semaphore.acquire_owned().await;
                        self.probe_batch(candidates).await
                    }
                })
                .collect();

            let outcomes = future::join_all(tasks).await;
            for outcome in outcomes {
                stats.rejected += outcome.rejected;
                stats.errors += outcome.errors;
                accepted.extend(outcome.accepted);
            }
            stats.windows_completed += 1;

            debug!(
                "Window {}/{} completed: {} accepted so far, {} errors",
                window_idx + 1,
                windows.len(),
                accepted.len(),
                stats.errors
            );
        }

        if stats.cancelled {
            warn!(
                "Discovery cancelled after {}/{} windows",
                stats.windows_completed,
                windows.len()
            );
        }

        let mut by_id: HashMap<String, CapabilityDescriptor> = HashMap::new();
        for candidate in &accepted {
            let descriptor = describe(candidate);
            by_id.insert(descriptor.id.clone(), descriptor);
        }
        let mut descriptors: Vec<CapabilityDescriptor> = by_id.into_values().collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        stats.discovered = descriptors.len();

        if !stats.cancelled {
            self.sample_validate(&mut descriptors, &mut stats).await;
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "✅ Discovery finished: {} discovered, {} rejected, {} errors, confidence {:.2} in {}ms",
            stats.discovered, stats.rejected, stats.errors, stats.confidence, stats.duration_ms
        );

        Ok(DiscoveryResult { descriptors, stats })
    }

    /// Probe one batch: a combined request where supported, per-candidate otherwise
    async fn probe_batch(&self, candidates: &[Candidate]) -> BatchOutcome {
        if self.host.supports_batch_validation() && candidates.len() > 1 {
            let node_types: Vec<String> = candidates.iter().map(|c| c.node_type.clone()).collect();
            match self.host.validate(&node_types).await {
                Ok(ProbeOutcome::Accepted { artifact_id }) => {
                    self.cleanup_artifact(artifact_id).await;
                    return BatchOutcome {
                        accepted: candidates.to_vec(),
                        ..BatchOutcome::default()
                    };
                }
                Ok(ProbeOutcome::Rejected { reason }) => {
                    debug!(
                        "Batch of {} rejected ({}), probing candidates individually",
                        candidates.len(),
                        reason
                    );
                }
                Err(e) => {
                    warn!("Batch of {} candidates failed: {}", candidates.len(), e);
                    return BatchOutcome {
                        errors: 1,
                        ..BatchOutcome::default()
                    };
                }
            }
        }

        let mut outcome = BatchOutcome::default();
        for candidate in candidates {
            match self.probe_single(candidate).await {
                SingleOutcome::Accepted => outcome.accepted.push(candidate.clone()),
                SingleOutcome::Rejected => outcome.rejected += 1,
                SingleOutcome::Failed => outcome.errors += 1,
            }
        }
        outcome
    }

    async fn probe_single(&self, candidate: &Candidate) -> SingleOutcome {
        match self.host.validate(std::slice::from_ref(&candidate.node_type)).await {
            Ok(ProbeOutcome::Accepted { artifact_id }) => {
                self.cleanup_artifact(artifact_id).await;
                SingleOutcome::Accepted
            }
            Ok(ProbeOutcome::Rejected { reason }) => {
                debug!("Candidate '{}' rejected: {}", candidate.node_type, reason);
                SingleOutcome::Rejected
            }
            Err(e) => {
                debug!("Probe for '{}' failed: {}", candidate.node_type, e);
                SingleOutcome::Failed
            }
        }
    }

    async fn cleanup_artifact(&self, artifact_id: Option<String>) {
        if let Some(id) = artifact_id {
            if let Err(e) = self.host.delete_artifact(&id).await {
                debug!("Failed to delete validation artifact {}: {}", id, e);
            }
        }
    }

    /// Re-validate the first `sample_size` descriptors one by one
    async fn sample_validate(&self, descriptors: &mut [CapabilityDescriptor], stats: &mut DiscoveryStats) {
        let sample = self.config.sample_size.min(descriptors.len());
        stats.sample_size = sample;
        if sample == 0 {
            return;
        }

        let mut validated = 0;
        for descriptor in descriptors.iter_mut().take(sample) {
            let candidate = Candidate::new(descriptor.node_type.clone(), CandidateSource::Seed);
            match self.probe_single(&candidate).await {
                SingleOutcome::Accepted => validated += 1,
                _ => descriptor.validated = false,
            }
        }

        stats.sample_validated = validated;
        stats.confidence = validated as f64 / sample as f64;
        debug!("Sample validation: {}/{} confirmed", validated, sample);
    }
}

/// Deduplicate by canonical id in first-appearance order, preferring a namespaced
/// spelling. Returns the unique candidates and the number of malformed ones dropped.
fn dedupe(seeds: Vec<Candidate>) -> (Vec<Candidate>, usize) {
    let mut unique: Vec<Candidate> = Vec::with_capacity(seeds.len());
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut invalid = 0;

    for candidate in seeds {
        if !canonical::is_valid_identifier(&candidate.node_type) {
            debug!("Dropping malformed candidate '{}'", candidate.node_type);
            invalid += 1;
            continue;
        }

        match positions.get(&candidate.canonical_id) {
            Some(&index) => {
                let existing = &mut unique[index];
                if !existing.is_namespaced() && candidate.is_namespaced() {
                    *existing = candidate;
                } else if existing.package_version.is_none() && candidate.package_version.is_some() {
                    existing.package_version = candidate.package_version;
                }
            }
            None => {
                positions.insert(candidate.canonical_id.clone(), unique.len());
                unique.push(candidate);
            }
        }
    }

    (unique, invalid)
}

/// Build a descriptor for an accepted candidate, enriched from the catalog when known
fn describe(candidate: &Candidate) -> CapabilityDescriptor {
    let origin = canonical::infer_origin(&candidate.node_type);
    let package_name = canonical::package_name(&candidate.node_type);

    match catalog::lookup(&candidate.canonical_id).filter(|_| !candidate.canonical_id.contains('.')) {
        Some(entry) => CapabilityDescriptor {
            id: candidate.canonical_id.clone(),
            node_type: candidate.node_type.clone(),
            display_name: entry.display_name.to_string(),
            description: entry.description.to_string(),
            category: entry.category.to_string(),
            origin,
            package_name,
            package_version: candidate.package_version.clone(),
            credential_type: entry.credential_type.map(str::to_string),
            schema: serde_json::Value::Null,
            discovered_at: Utc::now(),
            validated: true,
        },
        None => {
            let name = display_name(canonical::node_name(&candidate.node_type));
            CapabilityDescriptor {
                id: candidate.canonical_id.clone(),
                node_type: candidate.node_type.clone(),
                description: format!("{} node", name),
                display_name: name,
                category: canonical::infer_category(&candidate.node_type).to_string(),
                origin,
                package_name,
                package_version: candidate.package_version.clone(),
                credential_type: None,
                schema: serde_json::Value::Null,
                discovered_at: Utc::now(),
                validated: true,
            }
        }
    }
}
