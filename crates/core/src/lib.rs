//! Core data models of the feature test engine.
//!
//! This crate defines the configuration view, the hierarchical identifiers
//! and the descriptor tree shared by discovery and execution.

#![warn(missing_docs)]

// Configuration
pub mod config;

// Identity and sources
mod id;
mod source;

// Discovery results
mod descriptor;
mod issue;

// Re-exports
pub use config::{
    ConfigError, Configuration, FEATURES_PROPERTY_NAME, FILTER_NAME_PROPERTY_NAME,
    PARALLEL_CONFIG_PREFIX, PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME,
};
pub use id::{IdError, Segment, UniqueId, ENGINE_SEGMENT, FEATURE_SEGMENT, SCENARIO_SEGMENT};
pub use source::{FilePosition, TestSource};
pub use descriptor::{DescriptorTree, EngineDescriptor, Node, NodeIndex, NodeKind, NodeSpec};
pub use issue::{DiscoveryIssue, Severity};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
