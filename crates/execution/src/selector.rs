//! Executor selection.

use crate::scheduler::ParallelExecutor;
use crate::ExecutionError;
use cuke_core::{Configuration, PARALLEL_CONFIG_PREFIX, PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which executor a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorKind {
    /// Depth-first on the calling thread
    Sequential,
    /// On a work-stealing pool
    Parallel,
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

/// Executor strategies available.
#[derive(Debug)]
pub enum ExecutionStrategy {
    /// Depth-first, one node at a time, siblings in order
    Sequential,
    /// Sibling subtrees run concurrently on a bounded pool
    Parallel(ParallelExecutor),
}

impl ExecutionStrategy {
    /// Pick the strategy for a run.
    ///
    /// The parallel executor only sees the parallel-scoped part of
    /// `configuration`.
    pub fn select(configuration: &Configuration) -> Result<Self, ExecutionError> {
        let parallel = configuration.get_bool_or(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, false)?;
        let strategy = if parallel {
            let executor = ParallelExecutor::new(&configuration.scoped(PARALLEL_CONFIG_PREFIX))?;
            info!(
                "Selected parallel executor with {} worker(s)",
                executor.parallelism()
            );
            Self::Parallel(executor)
        } else {
            info!("Selected sequential executor");
            Self::Sequential
        };
        Ok(strategy)
    }

    /// Kind of this strategy.
    pub fn kind(&self) -> ExecutorKind {
        match self {
            Self::Sequential => ExecutorKind::Sequential,
            Self::Parallel(_) => ExecutorKind::Parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sequential() {
        let strategy = ExecutionStrategy::select(&Configuration::new()).unwrap();
        assert_eq!(strategy.kind(), ExecutorKind::Sequential);
    }

    #[test]
    fn test_flag_selects_parallel() {
        let config = Configuration::from_pairs([
            (PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "true"),
            ("cucumber.execution.parallel.config.strategy", "fixed"),
            ("cucumber.execution.parallel.config.fixed.parallelism", "3"),
        ]);
        let strategy = ExecutionStrategy::select(&config).unwrap();
        let ExecutionStrategy::Parallel(executor) = strategy else {
            panic!("expected the parallel executor");
        };
        assert_eq!(executor.parallelism(), 3);
    }

    #[test]
    fn test_parallel_keys_are_scoped() {
        // Unscoped pool keys must not reach the parallel executor.
        let config = Configuration::from_pairs([
            (PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "true"),
            ("strategy", "bogus"),
        ]);
        assert!(ExecutionStrategy::select(&config).is_ok());
    }

    #[test]
    fn test_non_boolean_flag_is_fatal() {
        let config = Configuration::from_pairs([(PARALLEL_EXECUTION_ENABLED_PROPERTY_NAME, "sometimes")]);
        assert!(matches!(
            ExecutionStrategy::select(&config),
            Err(ExecutionError::Config(_))
        ));
    }
}
