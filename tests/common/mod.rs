//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use nodescout::discovery::{PackageInfo, PackageRegistry, ProbeOutcome, RemoteHost};
use nodescout::error::Result;
use nodescout::ScoutError;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-process remote host that accepts a configurable set of node types
pub struct FakeHost {
    /// Exact node types the host knows
    pub known: HashSet<String>,
    /// Namespace prefixes whose node types are all known
    pub known_prefixes: Vec<String>,
    /// A request containing any of these fails with a 500
    pub failing: HashSet<String>,
    /// Node types accepted on their first probe only
    pub flaky: Mutex<HashSet<String>>,
    pub batch_support: bool,
    pub delay: Duration,
    pub workflow_types: Option<Vec<String>>,
    pub validate_calls: AtomicUsize,
    pub deleted: AtomicUsize,
    pub schema_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeHost {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            known_prefixes: Vec::new(),
            failing: HashSet::new(),
            flaky: Mutex::new(HashSet::new()),
            batch_support: true,
            delay: Duration::ZERO,
            workflow_types: Some(Vec::new()),
            validate_calls: AtomicUsize::new(0),
            deleted: AtomicUsize::new(0),
            schema_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.known_prefixes = prefixes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_on(mut self, node_types: &[&str]) -> Self {
        self.failing = node_types.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn flaky_on(self, node_types: &[&str]) -> Self {
        *self.flaky.lock().unwrap() = node_types.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn without_workflows(mut self) -> Self {
        self.workflow_types = None;
        self
    }

    pub fn with_workflows(mut self, node_types: &[&str]) -> Self {
        self.workflow_types = Some(node_types.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    fn knows(&self, node_type: &str) -> bool {
        self.known.contains(node_type) || self.known_prefixes.iter().any(|p| node_type.starts_with(p.as_str()))
    }
}

#[async_trait]
impl RemoteHost for FakeHost {
    fn supports_batch_validation(&self) -> bool {
        self.batch_support
    }

    async fn validate(&self, node_types: &[String]) -> Result<ProbeOutcome> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if node_types.iter().any(|t| self.failing.contains(t)) {
            return Err(ScoutError::remote(Some(500), "internal error"));
        }

        let mut accepted = node_types.iter().all(|t| self.knows(t));
        if node_types.len() == 1 {
            let mut flaky = self.flaky.lock().unwrap();
            if flaky.contains(&node_types[0]) {
                accepted = true;
                flaky.remove(&node_types[0]);
            } else if !self.knows(&node_types[0]) {
                accepted = false;
            }
        } else if node_types.iter().any(|t| self.flaky.lock().unwrap().contains(t)) {
            accepted = false;
        }

        if accepted {
            Ok(ProbeOutcome::Accepted {
                artifact_id: Some(format!("wf-{}", self.calls())),
            })
        } else {
            Ok(ProbeOutcome::Rejected {
                reason: "400: unknown node type".to_string(),
            })
        }
    }

    async fn delete_artifact(&self, _artifact_id: &str) -> Result<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_workflow_node_types(&self) -> Result<Vec<String>> {
        self.workflow_types
            .clone()
            .ok_or_else(|| ScoutError::remote(Some(401), "unauthorized"))
    }

    async fn credential_schema(&self, credential_type: &str) -> Result<Option<Value>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        if credential_type == "slackApi" {
            Ok(Some(json!({ "type": "object", "properties": { "accessToken": { "type": "string" } } })))
        } else {
            Ok(None)
        }
    }
}

/// Package registry returning a fixed package list, or failing
pub struct FakeRegistry {
    pub packages: Option<Vec<PackageInfo>>,
}

impl FakeRegistry {
    pub fn with_packages(names: &[(&str, &str)]) -> Self {
        Self {
            packages: Some(
                names
                    .iter()
                    .map(|(name, version)| PackageInfo {
                        name: name.to_string(),
                        version: version.to_string(),
                        description: None,
                        keywords: vec!["n8n-community-node-package".to_string()],
                    })
                    .collect(),
            ),
        }
    }

    pub fn failing() -> Self {
        Self { packages: None }
    }
}

#[async_trait]
impl PackageRegistry for FakeRegistry {
    async fn search(&self, _keyword: &str, limit: usize) -> Result<Vec<PackageInfo>> {
        match &self.packages {
            Some(packages) => Ok(packages.iter().take(limit).cloned().collect()),
            None => Err(ScoutError::registry("registry unreachable")),
        }
    }
}
