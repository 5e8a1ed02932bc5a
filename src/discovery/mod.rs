//! Capability Discovery Module
//!
//! This module probes the remote automation platform for the node types it
//! exposes. Candidates come from a static catalog, generated name patterns,
//! existing workflows and a package registry search; each is validated against
//! the host in concurrency-bounded batches and turned into a
//! [`CapabilityDescriptor`].

pub mod canonical;
pub mod catalog;
pub mod client;
pub mod engine;
pub mod registry;
pub mod types;

pub use client::{N8nHost, RemoteConfig, RemoteHost};
pub use engine::{CandidateSet, DiscoveryEngine};
pub use registry::{NpmRegistry, PackageInfo, PackageRegistry, RegistryConfig};
pub use types::*;
