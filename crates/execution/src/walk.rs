//! Hierarchical walk over the descriptor tree.

use crate::context::{ExecutionContext, NodeRunner};
use crate::engine::Tally;
use crate::listener::{ExecutionListener, TestExecutionResult};
use crate::selector::ExecutionStrategy;
use cuke_core::{DescriptorTree, Node, NodeIndex, NodeKind};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

const CANCELLED: &str = "execution cancelled";
const PARENT_FAILED: &str = "parent failed";

/// Walks one tree with one context; shared by both strategies.
struct NodeWalker<'a> {
    tree: &'a DescriptorTree,
    context: &'a ExecutionContext,
    runner: &'a dyn NodeRunner,
    listener: &'a dyn ExecutionListener,
    parallel: bool,
}

/// Execute `tree` with the strategy stored in `context`.
pub(crate) fn execute_tree(
    tree: &DescriptorTree,
    context: &ExecutionContext,
    runner: &dyn NodeRunner,
    listener: &dyn ExecutionListener,
) -> Tally {
    match context.strategy() {
        ExecutionStrategy::Sequential => NodeWalker {
            tree,
            context,
            runner,
            listener,
            parallel: false,
        }
        .execute(NodeIndex::ROOT),
        ExecutionStrategy::Parallel(executor) => {
            let walker = NodeWalker {
                tree,
                context,
                runner,
                listener,
                parallel: true,
            };
            executor.install(|| walker.execute(NodeIndex::ROOT))
        }
    }
}

impl NodeWalker<'_> {
    /// Run `index` and, unless stopped, its subtree.
    fn execute(&self, index: NodeIndex) -> Tally {
        let node = self.tree.node(index);
        if self.context.is_cancelled() {
            return self.skip(index, CANCELLED);
        }

        self.listener.execution_started(node);
        let result = if index == NodeIndex::ROOT {
            TestExecutionResult::Successful
        } else {
            self.run_own_work(node)
        };

        let mut tally = Tally::default();
        if node.kind == NodeKind::Scenario {
            tally.record(&result);
        }

        let children = node.children();
        let children_tally = if !result.is_successful() {
            self.skip_all(children, PARENT_FAILED)
        } else if self.context.is_cancelled() {
            self.skip_all(children, CANCELLED)
        } else {
            self.dispatch(children)
        };

        self.listener.execution_finished(node, &result);
        tally.merge(children_tally)
    }

    fn run_own_work(&self, node: &Node) -> TestExecutionResult {
        debug!("Executing {}", node.unique_id);
        match catch_unwind(AssertUnwindSafe(|| self.runner.execute(node, self.context))) {
            Ok(Ok(())) => TestExecutionResult::Successful,
            Ok(Err(e)) => TestExecutionResult::Failed(format!("{:#}", e)),
            Err(panic) => TestExecutionResult::Aborted(panic_message(panic.as_ref())),
        }
    }

    fn dispatch(&self, children: &[NodeIndex]) -> Tally {
        if self.parallel {
            children
                .par_iter()
                .map(|&child| self.execute(child))
                .reduce(Tally::default, Tally::merge)
        } else {
            children
                .iter()
                .map(|&child| self.execute(child))
                .fold(Tally::default(), Tally::merge)
        }
    }

    fn skip(&self, index: NodeIndex, reason: &str) -> Tally {
        let node = self.tree.node(index);
        debug!("Skipping {}: {}", node.unique_id, reason);
        self.listener.execution_skipped(node, reason);
        Tally {
            skipped: self.scenarios_in(index),
            ..Tally::default()
        }
    }

    fn skip_all(&self, children: &[NodeIndex], reason: &str) -> Tally {
        children
            .iter()
            .map(|&child| self.skip(child, reason))
            .fold(Tally::default(), Tally::merge)
    }

    fn scenarios_in(&self, index: NodeIndex) -> usize {
        let node = self.tree.node(index);
        let own = usize::from(node.kind == NodeKind::Scenario);
        own + node
            .children()
            .iter()
            .map(|&child| self.scenarios_in(child))
            .sum::<usize>()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "node panicked".to_string()
    }
}
