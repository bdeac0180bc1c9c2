//! Resource locations and feature file lookup.

use cuke_core::TestSource;
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

/// File extension of feature files.
pub const FEATURE_EXTENSION: &str = "feature";

const CLASSPATH_SCHEME: &str = "classpath:";

/// Ordered roots that classpath names are resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    roots: Vec<PathBuf>,
}

impl Classpath {
    /// Create a classpath from its roots, in lookup order.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Every root holding a file called `name`.
    pub fn find_resource(&self, name: &str) -> Vec<(&Path, PathBuf)> {
        self.roots
            .iter()
            .map(|root| (root.as_path(), root.join(name)))
            .filter(|(_, path)| path.is_file())
            .collect()
    }

    /// Every root holding a directory called `name`.
    pub fn find_directory(&self, name: &str) -> Vec<(&Path, PathBuf)> {
        self.roots
            .iter()
            .map(|root| (root.as_path(), root.join(name)))
            .filter(|(_, path)| path.is_dir())
            .collect()
    }
}

/// Where a location points to, before lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// A slash-separated name resolved against the classpath
    Classpath(String),
    /// A filesystem path
    Path(PathBuf),
}

impl ResourceLocation {
    /// Parse a `classpath:` or `file:` URI.
    ///
    /// `file:` URIs are decoded, so `file://localhost/a%20b.feature` names
    /// the path `/a b.feature`.
    pub fn from_uri(uri: &str) -> Result<Self, String> {
        if let Some(name) = uri.strip_prefix(CLASSPATH_SCHEME) {
            return Ok(Self::Classpath(name.trim_start_matches('/').to_string()));
        }

        let url = Url::parse(uri).map_err(|e| format!("invalid URI '{}': {}", uri, e))?;
        if url.scheme() != "file" {
            return Err(format!("unsupported URI '{}'", uri));
        }
        url.to_file_path()
            .map(Self::Path)
            .map_err(|()| format!("URI '{}' does not name a local file", uri))
    }

    /// Parse a URI, treating scheme-less input as a path.
    pub fn from_uri_or_path(raw: &str) -> Result<Self, String> {
        if has_scheme(raw) {
            Self::from_uri(raw)
        } else {
            Ok(Self::Path(PathBuf::from(raw)))
        }
    }
}

impl std::fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classpath(name) => write!(f, "{}{}", CLASSPATH_SCHEME, name),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A location plus the lines it is narrowed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLocation {
    /// Where to look
    pub location: ResourceLocation,
    /// Selected lines; empty selects everything
    pub lines: Vec<usize>,
}

impl FeatureLocation {
    /// Parse `location[:line]*`, e.g. `classpath:a/b.feature:3:12`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut rest = raw.trim();
        let mut lines = Vec::new();
        while let Some((head, tail)) = rest.rsplit_once(':') {
            if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
                break;
            }
            let line = tail
                .parse::<usize>()
                .map_err(|_| format!("line '{}' out of range in '{}'", tail, raw))?;
            lines.push(line);
            rest = head;
        }
        lines.reverse();

        if rest.is_empty() {
            return Err(format!("no location in '{}'", raw));
        }

        Ok(Self {
            location: ResourceLocation::from_uri_or_path(rest)?,
            lines,
        })
    }
}

/// A feature file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureResource {
    /// URI used in unique ids, e.g. `classpath:com/example/a.feature`
    pub uri: String,
    /// Where the file lives
    pub path: PathBuf,
    /// Source attached to descriptors built from this file
    pub source: TestSource,
}

impl FeatureResource {
    /// A resource addressed through the classpath.
    pub fn classpath(name: &str, path: PathBuf) -> Self {
        Self {
            uri: format!("{}{}", CLASSPATH_SCHEME, name),
            path,
            source: TestSource::ClasspathResource {
                name: name.to_string(),
                position: None,
            },
        }
    }

    /// A resource addressed by its filesystem path.
    ///
    /// The URI is a proper `file:` URL and parses back to the same path.
    pub fn file(path: &Path) -> Self {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let uri = Url::from_file_path(&path)
            .map(String::from)
            .unwrap_or_else(|()| format!("file:{}", slashed(&path)));
        Self {
            uri,
            source: TestSource::File {
                path: path.clone(),
                position: None,
            },
            path,
        }
    }
}

/// Whether `path` names a feature file.
pub fn is_feature_file(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == FEATURE_EXTENSION)
}

/// Feature files below `dir`, sorted by path, plus entries that could not be read.
pub fn scan_features(dir: &Path) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_feature_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => errors.push(e),
        }
    }

    (files, errors)
}

/// Slash-separated name of `path` relative to `root`.
pub fn classpath_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn has_scheme(raw: &str) -> bool {
    match raw.split_once(':') {
        // A single letter is a drive, not a scheme.
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
