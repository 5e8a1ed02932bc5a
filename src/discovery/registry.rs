//! Package registry search for community node packages

use crate::discovery::canonical::node_name_from_package;
use crate::discovery::types::{Candidate, CandidateSource};
use crate::error::{Result, ScoutError};
use crate::utils::duration_millis;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A package found in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Searchable package registry
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Packages tagged with `keyword`, at most `limit`
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<PackageInfo>>;
}

/// Package registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub enabled: bool,
    pub base_url: String,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://registry.npmjs.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        Url::parse(&self.base_url)
            .map_err(|e| ScoutError::config(format!("Invalid registry URL '{}': {}", self.base_url, e)))?;
        if self.timeout.is_zero() {
            return Err(ScoutError::config("Registry request timeout cannot be zero"));
        }
        Ok(())
    }
}

/// npm registry search client
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    http_client: Client,
    search_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    objects: Vec<SearchObject>,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: PackageInfo,
}

impl NpmRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(&config.base_url)?;
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScoutError::registry(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            search_url: format!("{}/-/v1/search", base.as_str().trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PackageRegistry for NpmRegistry {
    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<PackageInfo>> {
        let text = format!("keywords:{}", keyword);
        // npm caps page size at 250
        let size = limit.clamp(1, 250).to_string();

        let response = self
            .http_client
            .get(&self.search_url)
            .query(&[("text", text.as_str()), ("size", size.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::registry(format!(
                "Registry search returned status {}",
                status.as_u16()
            )));
        }

        let body: SearchResponse = response.json().await?;
        let mut packages: Vec<PackageInfo> = body.objects.into_iter().map(|o| o.package).collect();
        packages.truncate(limit);

        debug!("Registry search for '{}' returned {} packages", keyword, packages.len());
        Ok(packages)
    }
}

/// Turn registry packages into candidates named `<package>.<derivedNodeName>`
pub fn community_candidates(packages: &[PackageInfo]) -> Vec<Candidate> {
    packages
        .iter()
        .filter_map(|package| {
            let node = node_name_from_package(&package.name)?;
            Some(
                Candidate::new(format!("{}.{}", package.name, node), CandidateSource::Registry)
                    .with_version(package.version.clone()),
            )
        })
        .collect()
}
