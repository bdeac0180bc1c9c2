//! Hierarchical identifiers for descriptor nodes.

use serde::{Deserialize, Serialize};

/// Segment kind of the engine root.
pub const ENGINE_SEGMENT: &str = "engine";
/// Segment kind of a feature file.
pub const FEATURE_SEGMENT: &str = "feature";
/// Segment kind of a scenario, keyed by its line number.
pub const SCENARIO_SEGMENT: &str = "scenario";

/// Errors produced when parsing a rendered [`UniqueId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input contained no segments
    #[error("unique id is empty")]
    Empty,

    /// A segment was not of the form `[kind:value]`
    #[error("malformed segment '{0}'")]
    MalformedSegment(String),

    /// A percent escape did not decode to UTF-8
    #[error("invalid escape in '{0}'")]
    InvalidEscape(String),
}

/// One `(kind, value)` step of a [`UniqueId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    /// Segment kind, e.g. `feature`
    pub kind: String,

    /// Segment value, e.g. a feature URI
    pub value: String,
}

impl Segment {
    /// Create a new segment.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Identifier addressing a node from the engine root.
///
/// A child's identifier is always its parent's identifier plus one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId(Vec<Segment>);

impl UniqueId {
    /// Identifier of an engine root.
    pub fn for_engine(engine_id: &str) -> Self {
        Self(vec![Segment::new(ENGINE_SEGMENT, engine_id)])
    }

    /// Extend this identifier by one segment.
    pub fn append(&self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::new(kind, value));
        Self(segments)
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// The engine id named by the root segment, if it is one.
    pub fn engine_id(&self) -> Option<&str> {
        self.0
            .first()
            .filter(|s| s.kind == ENGINE_SEGMENT)
            .map(|s| s.value.as_str())
    }

    /// First segment of the given kind.
    pub fn find(&self, kind: &str) -> Option<&Segment> {
        self.0.iter().find(|s| s.kind == kind)
    }

    /// Identifier of the parent node, `None` for a root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Whether `self` is `other` or one of its descendants.
    pub fn has_prefix(&self, other: &UniqueId) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "[{}:{}]", encode(&segment.kind), encode(&segment.value))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for UniqueId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        // Values are encoded, so '/' only ever separates segments.
        let segments = s
            .split('/')
            .map(|raw| {
                let inner = raw
                    .strip_prefix('[')
                    .and_then(|r| r.strip_suffix(']'))
                    .ok_or_else(|| IdError::MalformedSegment(raw.to_string()))?;
                let (kind, value) = inner
                    .split_once(':')
                    .ok_or_else(|| IdError::MalformedSegment(raw.to_string()))?;
                if kind.is_empty() {
                    return Err(IdError::MalformedSegment(raw.to_string()));
                }
                Ok(Segment::new(decode(kind)?, decode(value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

fn encode(raw: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(raw)
}

fn decode(raw: &str) -> Result<String, IdError> {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .map_err(|_| IdError::InvalidEscape(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_encodes_uri_values() {
        let id = UniqueId::for_engine("cucumber")
            .append(FEATURE_SEGMENT, "classpath:com/example/a.feature")
            .append(SCENARIO_SEGMENT, "7");

        assert_eq!(
            id.to_string(),
            "[engine:cucumber]/[feature:classpath%3Acom%2Fexample%2Fa.feature]/[scenario:7]"
        );
    }

    #[test]
    fn test_parse_rendered_id() {
        let id = UniqueId::for_engine("cucumber").append(FEATURE_SEGMENT, "file:/tmp/[x].feature");
        let parsed: UniqueId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.find(FEATURE_SEGMENT).unwrap().value, "file:/tmp/[x].feature");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<UniqueId>(), Err(IdError::Empty));
        assert!(matches!(
            "[engine:cucumber]/feature".parse::<UniqueId>(),
            Err(IdError::MalformedSegment(_))
        ));
        assert!(matches!(
            "[engine:cu%FF]".parse::<UniqueId>(),
            Err(IdError::InvalidEscape(_))
        ));
    }

    #[test]
    fn test_parent_and_prefix() {
        let root = UniqueId::for_engine("cucumber");
        let feature = root.append(FEATURE_SEGMENT, "file:/a.feature");
        assert_eq!(feature.parent(), Some(root.clone()));
        assert!(feature.has_prefix(&root));
        assert!(!root.has_prefix(&feature));
        assert_eq!(root.parent(), None);
        assert_eq!(feature.engine_id(), Some("cucumber"));
    }

    #[test]
    fn test_values_with_spaces_and_escapes() {
        let id = UniqueId::for_engine("cucumber")
            .append(FEATURE_SEGMENT, "file:///tmp/a%20b.feature")
            .append(SCENARIO_SEGMENT, "3");
        let rendered = id.to_string();
        assert!(!rendered.contains(' '));
        let parsed: UniqueId = rendered.parse().unwrap();
        assert_eq!(parsed.find(FEATURE_SEGMENT).unwrap().value, "file:///tmp/a%20b.feature");
    }

    #[test]
    fn test_deserialized_empty_id_is_harmless() {
        let id: UniqueId = serde_json::from_str("[]").unwrap();
        assert!(id.segments().is_empty());
        assert_eq!(id.engine_id(), None);
        assert_eq!(id.parent(), None);
        assert!(id.find(FEATURE_SEGMENT).is_none());
    }
}
