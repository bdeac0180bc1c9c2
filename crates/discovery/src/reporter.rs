//! Issue reporting pipeline.
//!
//! Issues travel from the resolver through a [`DeduplicatingReporter`] into a
//! [`ForwardingReporter`], which hands them to the host's
//! [`DiscoveryListener`]. A single malformed input is often touched by more
//! than one resolution step, so duplicates are dropped before they reach the
//! host.

use cuke_core::{DiscoveryIssue, Severity, TestSource, UniqueId};
use std::collections::HashSet;

/// Host-side sink for discovery issues.
pub trait DiscoveryListener {
    /// Called once per forwarded issue.
    fn issue_encountered(&mut self, engine_id: &UniqueId, issue: DiscoveryIssue);
}

/// Listener that keeps every issue in memory.
#[derive(Debug, Default)]
pub struct CollectingListener {
    /// Issues in the order they arrived
    pub issues: Vec<DiscoveryIssue>,
}

impl CollectingListener {
    /// Create an empty listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues of the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<&DiscoveryIssue> {
        self.issues.iter().filter(|i| i.severity == severity).collect()
    }
}

impl DiscoveryListener for CollectingListener {
    fn issue_encountered(&mut self, _engine_id: &UniqueId, issue: DiscoveryIssue) {
        self.issues.push(issue);
    }
}

/// Receives issues produced during resolution.
pub trait IssueReporter {
    /// Report one issue.
    fn report(&mut self, issue: DiscoveryIssue);
}

/// Forwards issues to a [`DiscoveryListener`] on behalf of one engine.
pub struct ForwardingReporter<'a> {
    listener: &'a mut dyn DiscoveryListener,
    engine_id: UniqueId,
}

impl<'a> ForwardingReporter<'a> {
    /// Create a reporter for `engine_id`.
    pub fn new(listener: &'a mut dyn DiscoveryListener, engine_id: UniqueId) -> Self {
        Self { listener, engine_id }
    }
}

impl IssueReporter for ForwardingReporter<'_> {
    fn report(&mut self, mut issue: DiscoveryIssue) {
        if issue.unique_id.is_none() {
            issue.unique_id = Some(self.engine_id.clone());
        }
        self.listener.issue_encountered(&self.engine_id, issue);
    }
}

/// Suppresses issues already reported in this pass; the first one wins.
///
/// Two issues are equal when severity, message and source are equal.
pub struct DeduplicatingReporter<R> {
    inner: R,
    seen: HashSet<(Severity, String, Option<TestSource>)>,
}

impl<R: IssueReporter> DeduplicatingReporter<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            seen: HashSet::new(),
        }
    }

    /// Number of distinct issues forwarded so far.
    pub fn forwarded(&self) -> usize {
        self.seen.len()
    }
}

impl<R: IssueReporter> IssueReporter for DeduplicatingReporter<R> {
    fn report(&mut self, issue: DiscoveryIssue) {
        let key = (issue.severity, issue.message.clone(), issue.source.clone());
        if self.seen.insert(key) {
            self.inner.report(issue);
        } else {
            tracing::trace!("Suppressed duplicate discovery issue: {}", issue);
        }
    }
}
