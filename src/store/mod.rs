//! Persistent store seam
//!
//! Discovery writes descriptors here and the selector warm-starts its usage
//! statistics from here. Two backends exist: [`MemoryStore`] and [`JsonFileStore`].

mod file;

pub use file::JsonFileStore;

use crate::discovery::CapabilityDescriptor;
use crate::error::{Result, ScoutError};
use crate::selector::UsageStat;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Write-sink for descriptors, read-source for usage statistics
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Insert or replace a descriptor by id
    async fn store(&self, descriptor: &CapabilityDescriptor) -> Result<()>;

    /// Store many descriptors; returns how many were written
    async fn store_all(&self, descriptors: &[CapabilityDescriptor]) -> Result<usize> {
        for descriptor in descriptors {
            self.store(descriptor).await?;
        }
        Ok(descriptors.len())
    }

    async fn load_descriptors(&self) -> Result<Vec<CapabilityDescriptor>>;

    async fn load_usage_stats(&self) -> Result<Vec<UsageStat>>;

    /// Replace the stored usage statistics
    async fn save_usage_stats(&self, stats: &[UsageStat]) -> Result<()>;
}

/// Store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    Json,
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// File path for the JSON backend
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kind == StoreKind::Json && self.path.is_none() {
            return Err(ScoutError::config("JSON store requires a path"));
        }
        Ok(())
    }
}

/// Open the configured backend
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn CapabilityStore>> {
    config.validate()?;
    match (config.kind, &config.path) {
        (StoreKind::Json, Some(path)) => Ok(Arc::new(JsonFileStore::open(path.clone()).await?)),
        _ => Ok(Arc::new(MemoryStore::new())),
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    descriptors: RwLock<BTreeMap<String, CapabilityDescriptor>>,
    usage: RwLock<Vec<UsageStat>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate usage statistics
    pub fn with_usage(stats: Vec<UsageStat>) -> Self {
        Self {
            descriptors: RwLock::new(BTreeMap::new()),
            usage: RwLock::new(stats),
        }
    }
}

#[async_trait]
impl CapabilityStore for MemoryStore {
    async fn store(&self, descriptor: &CapabilityDescriptor) -> Result<()> {
        self.descriptors
            .write()
            .await
            .insert(descriptor.id.clone(), descriptor.clone());
        Ok(())
    }

    async fn load_descriptors(&self) -> Result<Vec<CapabilityDescriptor>> {
        Ok(self.descriptors.read().await.values().cloned().collect())
    }

    async fn load_usage_stats(&self) -> Result<Vec<UsageStat>> {
        Ok(self.usage.read().await.clone())
    }

    async fn save_usage_stats(&self, stats: &[UsageStat]) -> Result<()> {
        *self.usage.write().await = stats.to_vec();
        Ok(())
    }
}
