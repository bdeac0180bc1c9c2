//! Execution events reported to the host.

use cuke_core::{Node, UniqueId};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Outcome of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestExecutionResult {
    /// The node's own work succeeded
    Successful,
    /// The node's own work returned an error
    Failed(String),
    /// The node's own work panicked
    Aborted(String),
}

impl TestExecutionResult {
    /// Whether this is a success.
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Successful)
    }
}

/// Host-side sink for execution events.
///
/// Under the parallel strategy events arrive from several worker threads.
pub trait ExecutionListener: Send + Sync {
    /// A node is about to run.
    fn execution_started(&self, node: &Node);

    /// A node will not run.
    fn execution_skipped(&self, node: &Node, reason: &str);

    /// A node ran.
    fn execution_finished(&self, node: &Node, result: &TestExecutionResult);
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionEvent {
    /// See [`ExecutionListener::execution_started`]
    Started(UniqueId),
    /// See [`ExecutionListener::execution_skipped`]
    Skipped(UniqueId, String),
    /// See [`ExecutionListener::execution_finished`]
    Finished(UniqueId, TestExecutionResult),
}

impl ExecutionEvent {
    /// Node the event is about.
    pub fn unique_id(&self) -> &UniqueId {
        match self {
            Self::Started(id) | Self::Skipped(id, _) | Self::Finished(id, _) => id,
        }
    }
}

/// Listener keeping every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingListener {
    /// Create an empty listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events so far.
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ids of started nodes, in order.
    pub fn started(&self) -> Vec<UniqueId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecutionEvent::Started(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ExecutionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ExecutionListener for RecordingListener {
    fn execution_started(&self, node: &Node) {
        self.push(ExecutionEvent::Started(node.unique_id.clone()));
    }

    fn execution_skipped(&self, node: &Node, reason: &str) {
        self.push(ExecutionEvent::Skipped(node.unique_id.clone(), reason.to_string()));
    }

    fn execution_finished(&self, node: &Node, result: &TestExecutionResult) {
        self.push(ExecutionEvent::Finished(node.unique_id.clone(), result.clone()));
    }
}
