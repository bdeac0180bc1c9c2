//! Source locations attached to descriptors and issues.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A position inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePosition {
    /// 1-based line
    pub line: usize,

    /// 1-based column
    pub column: Option<usize>,
}

impl FilePosition {
    /// A position naming only a line.
    pub fn line(line: usize) -> Self {
        Self { line, column: None }
    }
}

/// Where a descriptor or issue comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestSource {
    /// A type name; used as a synthetic marker on the engine root
    Class(String),

    /// A file on disk
    File {
        /// Path of the file
        path: PathBuf,
        /// Optional position inside it
        position: Option<FilePosition>,
    },

    /// A resource found under one of the classpath roots
    ClasspathResource {
        /// Slash-separated resource name
        name: String,
        /// Optional position inside it
        position: Option<FilePosition>,
    },

    /// Anything else addressable by URI
    Uri(String),
}

impl TestSource {
    /// Same source narrowed to `position`.
    pub fn at(&self, position: FilePosition) -> Self {
        match self {
            Self::File { path, .. } => Self::File {
                path: path.clone(),
                position: Some(position),
            },
            Self::ClasspathResource { name, .. } => Self::ClasspathResource {
                name: name.clone(),
                position: Some(position),
            },
            other => other.clone(),
        }
    }
}

impl std::fmt::Display for TestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let position = match self {
            Self::Class(name) => return write!(f, "class {}", name),
            Self::Uri(uri) => return f.write_str(uri),
            Self::File { path, position } => {
                write!(f, "{}", path.display())?;
                position
            }
            Self::ClasspathResource { name, position } => {
                write!(f, "classpath:{}", name)?;
                position
            }
        };
        if let Some(p) = position {
            write!(f, ":{}", p.line)?;
            if let Some(column) = p.column {
                write!(f, ":{}", column)?;
            }
        }
        Ok(())
    }
}
