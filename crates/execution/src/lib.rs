//! Execution layer - executor selection, context propagation and the tree walk.

#![warn(missing_docs)]

pub mod selector;
pub mod scheduler;
pub mod context;
pub mod listener;
pub mod engine;
mod walk;

pub use selector::{ExecutionStrategy, ExecutorKind};
pub use scheduler::{available_processors, ParallelConfig, ParallelExecutor, ParallelStrategy};
pub use context::{CancellationToken, ExecutionContext, NodeRunner};
pub use listener::{ExecutionEvent, ExecutionListener, RecordingListener, TestExecutionResult};
pub use engine::{ExecutionRun, RunPhase, RunSummary, Tally};

use cuke_core::ConfigError;

/// Execution errors
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Executor configuration is invalid
    #[error("invalid executor configuration: {0}")]
    Config(#[from] ConfigError),

    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// A run was driven out of order
    #[error("cannot move run from {from:?} to {to}")]
    InvalidTransition {
        /// Phase the run was in
        from: RunPhase,
        /// Phase that was requested
        to: &'static str,
    },
}

/// Result type for execution operations
pub type Result<T> = std::result::Result<T, ExecutionError>;
