//! One execution run - selection, walk and completion.

use crate::context::{ExecutionContext, NodeRunner};
use crate::listener::{ExecutionListener, TestExecutionResult};
use crate::selector::ExecutorKind;
use crate::walk::execute_tree;
use crate::ExecutionError;
use cuke_core::{DescriptorTree, Time};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Scenario outcomes of a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// Scenarios that succeeded
    pub succeeded: usize,
    /// Scenarios that returned an error
    pub failed: usize,
    /// Scenarios that panicked
    pub aborted: usize,
    /// Scenarios that never ran
    pub skipped: usize,
}

impl Tally {
    /// Count one result.
    pub fn record(&mut self, result: &TestExecutionResult) {
        match result {
            TestExecutionResult::Successful => self.succeeded += 1,
            TestExecutionResult::Failed(_) => self.failed += 1,
            TestExecutionResult::Aborted(_) => self.aborted += 1,
        }
    }

    /// Sum of two tallies.
    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            aborted: self.aborted + other.aborted,
            skipped: self.skipped + other.skipped,
        }
    }

    /// Scenarios counted.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.aborted + self.skipped
    }
}

/// Where a run is in its lifecycle.
///
/// ```text
/// Unselected → Selected(kind) → Running(kind) → Completed(kind)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// No executor chosen yet
    Unselected,
    /// Executor chosen and context built
    Selected(ExecutorKind),
    /// Tree being walked
    Running(ExecutorKind),
    /// Root subtree finished
    Completed(ExecutorKind),
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Executor the run used
    pub executor: ExecutorKind,
    /// When the walk started
    pub started_at: Time,
    /// When the root finished
    pub finished_at: Time,
    /// Scenario outcomes
    pub tally: Tally,
}

impl RunSummary {
    /// Wall-clock duration of the walk.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives one run through its phases.
///
/// The context is installed once on selection and never replaced.
#[derive(Debug)]
pub struct ExecutionRun {
    phase: RunPhase,
    context: Option<ExecutionContext>,
}

impl ExecutionRun {
    /// Create a run with no executor selected.
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Unselected,
            context: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The context, once selected.
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.context.as_ref()
    }

    /// Install the context built for the selected executor.
    pub fn select(&mut self, context: ExecutionContext) -> Result<&ExecutionContext, ExecutionError> {
        if self.phase != RunPhase::Unselected {
            return Err(ExecutionError::InvalidTransition {
                from: self.phase,
                to: "selected",
            });
        }
        self.phase = RunPhase::Selected(context.executor_kind());
        Ok(self.context.insert(context))
    }

    /// Walk `tree`, reporting to `listener`.
    pub fn execute(
        &mut self,
        tree: &DescriptorTree,
        runner: &dyn NodeRunner,
        listener: &dyn ExecutionListener,
    ) -> Result<RunSummary, ExecutionError> {
        let (RunPhase::Selected(kind), Some(context)) = (self.phase, self.context.as_ref()) else {
            return Err(ExecutionError::InvalidTransition {
                from: self.phase,
                to: "running",
            });
        };

        self.phase = RunPhase::Running(kind);
        info!("Executing {} node(s) with the {} executor", tree.len(), kind);

        let started_at = chrono::Utc::now();
        let tally = execute_tree(tree, context, runner, listener);
        let finished_at = chrono::Utc::now();

        self.phase = RunPhase::Completed(kind);
        info!(
            "Run completed: {} succeeded, {} failed, {} aborted, {} skipped",
            tally.succeeded, tally.failed, tally.aborted, tally.skipped
        );

        Ok(RunSummary {
            executor: kind,
            started_at,
            finished_at,
            tally,
        })
    }
}

impl Default for ExecutionRun {
    fn default() -> Self {
        Self::new()
    }
}
