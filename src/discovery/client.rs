//! Remote capability-host client
//!
//! The discovery engine talks to the automation platform through the [`RemoteHost`]
//! trait. [`N8nHost`] implements it over the platform's public REST API: a node type
//! is probed by creating a throwaway workflow containing it and observing whether
//! the host accepts it.

use crate::discovery::types::ProbeOutcome;
use crate::error::{Result, ScoutError};
use crate::utils::duration_millis;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Operations the discovery engine needs from the remote host
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Whether several node types can be validated in one combined request
    fn supports_batch_validation(&self) -> bool {
        true
    }

    /// Submit a validation artifact containing all given node types.
    /// Rejections are `Ok(ProbeOutcome::Rejected)`, not errors.
    async fn validate(&self, node_types: &[String]) -> Result<ProbeOutcome>;

    /// Delete a validation artifact created by [`RemoteHost::validate`]
    async fn delete_artifact(&self, artifact_id: &str) -> Result<()>;

    /// Node types used by workflows that already exist on the host
    async fn list_workflow_node_types(&self) -> Result<Vec<String>>;

    /// Schema of a credential type, `None` when the host does not know it
    async fn credential_schema(&self, credential_type: &str) -> Result<Option<Value>>;
}

/// Remote host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the platform (without the `/api/v1` suffix)
    pub base_url: String,
    /// API key sent with every request
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Header carrying the API key
    pub api_key_header: String,
    /// Per-request timeout
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Maximum pages fetched when listing workflows
    pub max_workflow_pages: usize,
    /// Page size when listing workflows
    pub workflow_page_size: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5678".to_string(),
            api_key: None,
            api_key_header: "X-N8N-API-KEY".to_string(),
            timeout: Duration::from_secs(10),
            max_workflow_pages: 10,
            workflow_page_size: 100,
        }
    }
}

impl RemoteConfig {
    /// Validate remote configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| ScoutError::config(format!("Invalid remote base URL '{}': {}", self.base_url, e)))?;
        if self.timeout.is_zero() {
            return Err(ScoutError::config("Remote request timeout cannot be zero"));
        }
        if self.api_key_header.trim().is_empty() {
            return Err(ScoutError::config("API key header name cannot be empty"));
        }
        if self.workflow_page_size == 0 {
            return Err(ScoutError::config("Workflow page size must be greater than zero"));
        }
        Ok(())
    }
}

/// REST client for the automation platform's public API
#[derive(Debug, Clone)]
pub struct N8nHost {
    config: RemoteConfig,
    http_client: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowCreated {
    id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WorkflowPage {
    #[serde(default)]
    data: Vec<WorkflowSummary>,
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkflowSummary {
    #[serde(default)]
    nodes: Vec<WorkflowNode>,
}

#[derive(Debug, Deserialize)]
struct WorkflowNode {
    #[serde(rename = "type")]
    node_type: Option<String>,
}

impl N8nHost {
    /// Create a new client
    pub fn new(config: RemoteConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("nodescout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScoutError::remote(None, format!("Failed to create HTTP client: {}", e)))?;

        let api_base = format!("{}/api/v1", base_url.as_str().trim_end_matches('/'));

        Ok(Self {
            config,
            http_client,
            api_base,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header(self.config.api_key_header.as_str(), key.as_str()),
            None => request,
        }
    }

    /// Build the throwaway workflow used to probe node types
    fn probe_workflow(node_types: &[String]) -> Value {
        let nodes: Vec<Value> = node_types
            .iter()
            .enumerate()
            .map(|(index, node_type)| {
                json!({
                    "id": Uuid::new_v4().to_string(),
                    "name": format!("probe-{}", index),
                    "type": node_type,
                    "typeVersion": 1,
                    "position": [index as i64 * 200, 0],
                    "parameters": {},
                })
            })
            .collect();

        json!({
            "name": format!("nodescout-probe-{}", Uuid::new_v4()),
            "nodes": nodes,
            "connections": {},
            "settings": {},
        })
    }

    /// Statuses that mean "the host does not know this" rather than "something broke"
    fn is_rejection(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
        )
    }

    fn unexpected_status(status: StatusCode, body: &str, operation: &str) -> ScoutError {
        ScoutError::remote(
            Some(status.as_u16()),
            format!("{} failed: {}", operation, truncate(body, 200)),
        )
    }
}

#[async_trait]
impl RemoteHost for N8nHost {
    async fn validate(&self, node_types: &[String]) -> Result<ProbeOutcome> {
        let url = format!("{}/workflows", self.api_base);
        let body = Self::probe_workflow(node_types);

        let response = self
            .authorized(self.http_client.post(&url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            let created: WorkflowCreated = response.json().await.unwrap_or(WorkflowCreated { id: None });
            let artifact_id = created.id.map(|id| match id {
                Value::String(s) => s,
                other => other.to_string(),
            });
            debug!("Host accepted {} node type(s)", node_types.len());
            return Ok(ProbeOutcome::Accepted { artifact_id });
        }

        let text = response.text().await.unwrap_or_default();
        if Self::is_rejection(status) {
            return Ok(ProbeOutcome::Rejected {
                reason: format!("{}: {}", status.as_u16(), truncate(&text, 200)),
            });
        }

        Err(Self::unexpected_status(status, &text, "Validation request"))
    }

    async fn delete_artifact(&self, artifact_id: &str) -> Result<()> {
        let url = format!("{}/workflows/{}", self.api_base, urlencoding::encode(artifact_id));
        let response = self.authorized(self.http_client.delete(&url)).send().await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(Self::unexpected_status(status, &text, "Artifact deletion"))
    }

    async fn list_workflow_node_types(&self) -> Result<Vec<String>> {
        let url = format!("{}/workflows", self.api_base);
        let mut node_types = BTreeSet::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.config.max_workflow_pages {
            let mut request = self
                .authorized(self.http_client.get(&url))
                .query(&[("limit", self.config.workflow_page_size.to_string())]);
            if let Some(ref c) = cursor {
                request = request.query(&[("cursor", c.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(Self::unexpected_status(status, &text, "Workflow listing"));
            }

            let page_data: WorkflowPage = response.json().await?;
            for workflow in page_data.data {
                node_types.extend(workflow.nodes.into_iter().filter_map(|n| n.node_type));
            }

            match page_data.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }

            if page + 1 == self.config.max_workflow_pages {
                warn!(
                    "Stopped listing workflows after {} pages; remaining pages were skipped",
                    self.config.max_workflow_pages
                );
            }
        }

        debug!("Extracted {} distinct node types from existing workflows", node_types.len());
        Ok(node_types.into_iter().collect())
    }

    async fn credential_schema(&self, credential_type: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/credentials/schema/{}",
            self.api_base,
            urlencoding::encode(credential_type)
        );
        let response = self.authorized(self.http_client.get(&url)).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(Some(response.json().await?));
        }
        if Self::is_rejection(status) {
            return Ok(None);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Self::unexpected_status(status, &text, "Credential schema lookup"))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_workflow_contains_all_nodes() {
        let workflow = N8nHost::probe_workflow(&[
            "n8n-nodes-base.slack".to_string(),
            "n8n-nodes-base.gmail".to_string(),
        ]);
        let nodes = workflow["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1]["type"], "n8n-nodes-base.gmail");
        assert!(workflow["name"].as_str().unwrap().starts_with("nodescout-probe-"));
    }

    #[test]
    fn test_config_validation() {
        assert!(RemoteConfig::default().validate().is_ok());

        let config = RemoteConfig {
            base_url: "not a url".to_string(),
            ..RemoteConfig::default()
        };
        assert!(N8nHost::new(config).is_err());

        let config = RemoteConfig {
            timeout: Duration::ZERO,
            ..RemoteConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
