//! Error types for the attribute store
//!
//! Every failure is a local logic error: nothing is retried and no partial
//! state is left behind.

use crate::level::Level;
use std::path::PathBuf;
use strata_value::{AttrPath, NodeKind, Segment, Value};

/// Error returned by a change listener
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for store operations
pub type AttrResult<T> = Result<T, AttrError>;

/// Errors from reads and writes against the store
#[derive(Debug, thiserror::Error)]
pub enum AttrError {
    /// Mutation attempted through a merged (read-only) view
    #[error("cannot write '{path}' through an immutable merged view; use a level accessor")]
    ImmutableWrite {
        /// Path the write was aimed at
        path: AttrPath,
    },

    /// A container of one kind was found where another was needed
    #[error("type conflict in {level} at '{path}': expected {expected}, found {found}")]
    TypeConflict {
        /// Level being written
        level: Level,
        /// Location of the offending value
        path: AttrPath,
        /// Kind the write needed
        expected: NodeKind,
        /// Kind actually stored
        found: NodeKind,
    },

    /// Level not configured for this store, or not a level name at all
    #[error("unknown precedence level: '{0}'")]
    UnknownLevel(String),

    /// Strict read found nothing
    #[error("no attribute at '{0}'")]
    NotFound(AttrPath),

    /// Strict write met a missing container
    #[error("missing intermediate container in {level} at '{path}'")]
    MissingIntermediate {
        /// Level being written
        level: Level,
        /// First missing location
        path: AttrPath,
    },

    /// Sequence index past the end
    #[error("index {index} out of bounds in {level} at '{path}' (length {len})")]
    IndexOutOfBounds {
        /// Level being written
        level: Level,
        /// Location of the sequence
        path: AttrPath,
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// Operation needs at least one path segment
    #[error("empty attribute path")]
    EmptyPath,

    /// A change listener rejected the event; the write itself was applied
    #[error("change listener failed: {source}")]
    Listener {
        /// Listener's error
        #[source]
        source: ListenerError,
    },
}

impl AttrError {
    /// Create immutable-write error for path
    pub fn immutable_write(path: impl Into<AttrPath>) -> Self {
        Self::ImmutableWrite { path: path.into() }
    }

    /// Create type conflict error
    pub fn type_conflict(level: Level, path: AttrPath, expected: NodeKind, found: NodeKind) -> Self {
        Self::TypeConflict {
            level,
            path,
            expected,
            found,
        }
    }

    /// Type conflict for applying `segment` to a value of kind `found`
    pub(crate) fn segment_conflict(
        level: Level,
        path: AttrPath,
        segment: &Segment,
        found: NodeKind,
    ) -> Self {
        let expected = match segment {
            Segment::Key(_) => NodeKind::Mapping,
            Segment::Index(_) => NodeKind::Sequence,
        };
        Self::type_conflict(level, path, expected, found)
    }

    /// Create index out of bounds error
    pub fn index_out_of_bounds(level: Level, path: AttrPath, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            level,
            path,
            index,
            len,
        }
    }

    /// Create missing intermediate error
    pub fn missing_intermediate(level: Level, path: AttrPath) -> Self {
        Self::MissingIntermediate { level, path }
    }

    /// Wrap a listener failure
    pub fn listener(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

/// Cached merge result that no longer matches recomputation
///
/// Never produced when every mutation invalidates correctly; surfaced by
/// `AttributeStore::verify_coherence` for tests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("merge cache is stale for key '{key}'")]
pub struct CoherenceViolation {
    /// Top-level key whose entry is stale
    pub key: String,
    /// Value held by the cache
    pub cached: Value,
    /// Value a fresh merge produces (`None` if no level defines the key)
    pub recomputed: Option<Value>,
}

/// Errors loading or validating store configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No levels configured
    #[error("at least one precedence level must be configured")]
    NoLevels,

    /// Level listed twice
    #[error("precedence level '{0}' configured more than once")]
    DuplicateLevel(Level),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_value::attr_path;

    #[test]
    fn messages_name_the_location() {
        let err = AttrError::type_conflict(
            Level::Default,
            attr_path!["a"],
            NodeKind::Mapping,
            NodeKind::Leaf,
        );
        assert_eq!(
            err.to_string(),
            "type conflict in default at 'a': expected mapping, found leaf"
        );

        let err = AttrError::immutable_write(attr_path!["a", "b"]);
        assert!(err.to_string().contains("'a.b'"));
    }

    #[test]
    fn segment_conflict_picks_expected_kind() {
        let err = AttrError::segment_conflict(
            Level::Normal,
            attr_path!["list"],
            &Segment::Index(0),
            NodeKind::Mapping,
        );
        assert!(matches!(
            err,
            AttrError::TypeConflict {
                expected: NodeKind::Sequence,
                found: NodeKind::Mapping,
                ..
            }
        ));
    }

    #[test]
    fn listener_error_keeps_source() {
        let err = AttrError::listener("audit sink offline".into());
        assert_eq!(err.to_string(), "change listener failed: audit sink offline");
        assert!(std::error::Error::source(&err).is_some());
    }
}
