//! Run-scoped execution state shared by every node.

use crate::selector::{ExecutionStrategy, ExecutorKind};
use cuke_core::{Configuration, Node};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Host-controlled cancellation flag.
///
/// Clones share the flag. Cancellation is observed between nodes, never
/// in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Read-only context handed to every node of one run.
///
/// Built once, right after the executor is selected, from the configuration
/// the tree was discovered with.
#[derive(Debug)]
pub struct ExecutionContext {
    configuration: Arc<Configuration>,
    strategy: ExecutionStrategy,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    /// Create a context.
    pub fn new(
        configuration: Arc<Configuration>,
        strategy: ExecutionStrategy,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            configuration,
            strategy,
            cancellation,
        }
    }

    /// Configuration of the run.
    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// The selected strategy.
    pub fn strategy(&self) -> &ExecutionStrategy {
        &self.strategy
    }

    /// Kind of the selected strategy.
    pub fn executor_kind(&self) -> ExecutorKind {
        self.strategy.kind()
    }

    /// Whether the host cancelled the run.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// The host's work for a single node.
///
/// Runs before the node's children are dispatched. Implementations must not
/// rely on ordering between sibling nodes.
pub trait NodeRunner: Send + Sync {
    /// Run the node's own work.
    fn execute(&self, node: &Node, context: &ExecutionContext) -> anyhow::Result<()>;
}

impl<F> NodeRunner for F
where
    F: Fn(&Node, &ExecutionContext) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, node: &Node, context: &ExecutionContext) -> anyhow::Result<()> {
        self(node, context)
    }
}
