//! Payload kinds stored in the service cache

use crate::discovery::CapabilityDescriptor;
use crate::selector::Selection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cache key holding the latest discovery result
pub const DISCOVERY_KEY: &str = "discovery:capabilities";

/// Prefix of credential schema keys
pub const SCHEMA_KEY_PREFIX: &str = "schema:credential:";

/// Prefix of cached selections
pub const SELECTION_KEY_PREFIX: &str = "selection:";

/// Values the service keeps in its [`AdaptiveCache`](crate::cache::AdaptiveCache)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedPayload {
    Capabilities(Vec<CapabilityDescriptor>),
    Schema(Value),
    Selection(Selection),
}

impl CachedPayload {
    pub fn into_capabilities(self) -> Option<Vec<CapabilityDescriptor>> {
        match self {
            CachedPayload::Capabilities(descriptors) => Some(descriptors),
            _ => None,
        }
    }

    pub fn into_schema(self) -> Option<Value> {
        match self {
            CachedPayload::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn into_selection(self) -> Option<Selection> {
        match self {
            CachedPayload::Selection(selection) => Some(selection),
            _ => None,
        }
    }
}

/// Key of a cached credential schema
pub fn schema_key(credential_type: &str) -> String {
    format!("{}{}", SCHEMA_KEY_PREFIX, credential_type)
}
