//! Engine abstraction.

use crate::Result;
use cuke_core::{Configuration, EngineDescriptor, UniqueId};
use cuke_discovery::{DiscoveryListener, DiscoveryRequest};
use cuke_execution::{
    CancellationToken, ExecutionContext, ExecutionListener, ExecutionStrategy, NodeRunner,
    RunSummary,
};
use std::sync::Arc;

/// A test engine: discovers a tree, then executes it.
pub trait TestEngine: Send + Sync {
    /// Engine id, used as the first unique id segment.
    fn id(&self) -> &str;

    /// Build the descriptor tree for `request`.
    ///
    /// Problems with individual selectors go to `listener`; only errors that
    /// make discovery impossible are returned.
    fn discover(
        &self,
        request: &DiscoveryRequest,
        unique_id: UniqueId,
        listener: &mut dyn DiscoveryListener,
    ) -> Result<EngineDescriptor>;

    /// Pick the executor for a run over `configuration`.
    fn select_executor(&self, configuration: &Configuration) -> Result<ExecutionStrategy>;

    /// Build the context every node of the run sees.
    fn create_execution_context(
        &self,
        configuration: Arc<Configuration>,
        strategy: ExecutionStrategy,
        cancellation: CancellationToken,
    ) -> ExecutionContext {
        ExecutionContext::new(configuration, strategy, cancellation)
    }

    /// Execute a discovered tree.
    fn execute(&self, request: ExecutionRequest<'_>) -> Result<RunSummary>;
}

/// Everything one execution reads.
///
/// The run's configuration is always the one the root was discovered with.
pub struct ExecutionRequest<'a> {
    /// Root of the discovered tree
    pub root: &'a EngineDescriptor,

    /// Receives per-node events
    pub listener: &'a dyn ExecutionListener,

    /// The host's work for each node
    pub runner: &'a dyn NodeRunner,

    /// Lets the host stop the run between nodes
    pub cancellation: CancellationToken,
}

impl<'a> ExecutionRequest<'a> {
    /// Create a request that is never cancelled unless the token is replaced.
    pub fn new(
        root: &'a EngineDescriptor,
        listener: &'a dyn ExecutionListener,
        runner: &'a dyn NodeRunner,
    ) -> Self {
        Self {
            root,
            listener,
            runner,
            cancellation: CancellationToken::new(),
        }
    }

    /// Use `cancellation` for this run.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Configuration the root was discovered with.
    pub fn configuration(&self) -> &Arc<Configuration> {
        self.root.configuration()
    }
}
