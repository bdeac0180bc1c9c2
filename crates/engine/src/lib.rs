//! Test engine for Gherkin feature files.
//!
//! Discovery turns selectors (or the `cucumber.features` override) into a
//! descriptor tree; execution walks that tree with the executor the
//! configuration selects.

#![warn(missing_docs)]

pub mod r#trait;
pub mod cucumber;

pub use r#trait::{ExecutionRequest, TestEngine};
pub use cucumber::{CucumberEngine, ENGINE_ID};

use cuke_discovery::DiscoveryError;
use cuke_execution::ExecutionError;

/// Engine errors
///
/// Configuration problems surface through the layer that read the value.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Discovery could not complete
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Execution could not start or finish
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
