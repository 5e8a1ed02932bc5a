use super::CapabilityStore;
use crate::discovery::CapabilityDescriptor;
use crate::error::{Result, ScoutError};
use crate::selector::UsageStat;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// On-disk layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    descriptors: BTreeMap<String, CapabilityDescriptor>,
    #[serde(default)]
    usage: Vec<UsageStat>,
    last_saved: Option<DateTime<Utc>>,
}

/// Store backed by a single pretty-printed JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: RwLock<StoreSnapshot>,
}

impl JsonFileStore {
    /// Open the store, loading the file if it exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = if Path::new(&path).exists() {
            let json_data = fs::read_to_string(&path).await?;
            let snapshot: StoreSnapshot = serde_json::from_str(&json_data).map_err(|e| {
                ScoutError::store(format!("Corrupt store file {}: {}", path.display(), e))
            })?;
            info!(
                "Loaded {} descriptors and {} usage records from {}",
                snapshot.descriptors.len(),
                snapshot.usage.len(),
                path.display()
            );
            snapshot
        } else {
            StoreSnapshot::default()
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, snapshot: &mut StoreSnapshot) -> Result<()> {
        snapshot.last_saved = Some(Utc::now());

        if let Some(parent_dir) = self.path.parent() {
            if !parent_dir.as_os_str().is_empty() {
                fs::create_dir_all(parent_dir).await?;
            }
        }

        let json_data = serde_json::to_string_pretty(&*snapshot)?;
        fs::write(&self.path, json_data).await?;
        debug!("Saved store to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl CapabilityStore for JsonFileStore {
    async fn store(&self, descriptor: &CapabilityDescriptor) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot
            .descriptors
            .insert(descriptor.id.clone(), descriptor.clone());
        self.save(&mut snapshot).await
    }

    async fn store_all(&self, descriptors: &[CapabilityDescriptor]) -> Result<usize> {
        let mut snapshot = self.snapshot.write().await;
        for descriptor in descriptors {
            snapshot
                .descriptors
                .insert(descriptor.id.clone(), descriptor.clone());
        }
        self.save(&mut snapshot).await?;
        Ok(descriptors.len())
    }

    async fn load_descriptors(&self) -> Result<Vec<CapabilityDescriptor>> {
        Ok(self.snapshot.read().await.descriptors.values().cloned().collect())
    }

    async fn load_usage_stats(&self) -> Result<Vec<UsageStat>> {
        Ok(self.snapshot.read().await.usage.clone())
    }

    async fn save_usage_stats(&self, stats: &[UsageStat]) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.usage = stats.to_vec();
        self.save(&mut snapshot).await
    }
}
