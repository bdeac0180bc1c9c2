//! Non-fatal problems found while resolving discovery inputs.

use crate::id::UniqueId;
use crate::source::TestSource;
use serde::{Deserialize, Serialize};

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational
    Info,
    /// Something was ignored or narrowed
    Warning,
    /// A selector could not be resolved
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Warning => f.write_str("WARNING"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// A problem found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    /// How bad it is
    pub severity: Severity,

    /// What happened
    pub message: String,

    /// Where it happened
    pub source: Option<TestSource>,

    /// Node the issue originates from
    pub unique_id: Option<UniqueId>,
}

impl DiscoveryIssue {
    /// Create an issue without location.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            source: None,
            unique_id: None,
        }
    }

    /// An error issue.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// A warning issue.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the source.
    pub fn with_source(mut self, source: TestSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the originating node.
    pub fn with_unique_id(mut self, unique_id: UniqueId) -> Self {
        self.unique_id = Some(unique_id);
        self
    }
}

impl std::fmt::Display for DiscoveryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}
