//! Discovery inputs.

use crate::resource::Classpath;
use cuke_core::{Configuration, FilePosition};
use std::path::PathBuf;
use std::sync::Arc;

/// Where to look for features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverySelector {
    /// Every feature below a classpath root
    ClasspathRoot(PathBuf),

    /// A single resource looked up on the classpath
    ClasspathResource {
        /// Slash-separated resource name, e.g. `com/example/a.feature`
        name: String,
        /// Optional position narrowing the selection to one scenario
        position: Option<FilePosition>,
    },

    /// Every feature below a dotted package, e.g. `com.example`
    Package(String),

    /// A single feature file
    File {
        /// Path of the file
        path: PathBuf,
        /// Optional position narrowing the selection to one scenario
        position: Option<FilePosition>,
    },

    /// Every feature below a directory
    Directory(PathBuf),

    /// A rendered [`cuke_core::UniqueId`]
    UniqueId(String),

    /// A `classpath:` or `file:` URI
    Uri(String),
}

impl DiscoverySelector {
    /// Select a file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            position: None,
        }
    }

    /// Select a classpath resource.
    pub fn classpath_resource(name: impl Into<String>) -> Self {
        Self::ClasspathResource {
            name: name.into(),
            position: None,
        }
    }

    /// Short name of the selector kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClasspathRoot(_) => "classpath-root",
            Self::ClasspathResource { .. } => "classpath-resource",
            Self::Package(_) => "package",
            Self::File { .. } => "file",
            Self::Directory(_) => "directory",
            Self::UniqueId(_) => "unique-id",
            Self::Uri(_) => "uri",
        }
    }
}

/// Everything one discovery pass reads.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    /// Selectors in the order they were given
    pub selectors: Vec<DiscoverySelector>,

    /// Configuration of the run
    pub configuration: Arc<Configuration>,

    /// Roots classpath selectors are resolved against
    pub classpath: Classpath,
}

impl DiscoveryRequest {
    /// Create a request over `configuration`.
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self {
            selectors: Vec::new(),
            configuration,
            classpath: Classpath::default(),
        }
    }

    /// Add a selector.
    pub fn with_selector(mut self, selector: DiscoverySelector) -> Self {
        self.selectors.push(selector);
        self
    }

    /// Set the classpath roots.
    pub fn with_classpath(mut self, classpath: Classpath) -> Self {
        self.classpath = classpath;
        self
    }
}
