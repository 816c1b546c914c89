//! Attribute paths
//!
//! Provides [`AttrPath`] for addressing nested values from the root of a
//! precedence level or a merged result.

use crate::key::{Canonicalize, Symbol};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of an [`AttrPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Canonical mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

impl Segment {
    /// Key text, if this is a key segment
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            Self::Index(_) => None,
        }
    }

    /// Index, if this is an index segment
    #[inline]
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Key(_) => None,
            Self::Index(i) => Some(*i),
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.canonicalize())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for Segment {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl From<Symbol> for Segment {
    fn from(key: Symbol) -> Self {
        Self::Key(key.canonicalize())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Path from the root of an attribute tree
///
/// # Examples
/// - `["network", "interfaces", "eth0"]` → `network.interfaces.eth0`
/// - `["packages", 0, "name"]` → `packages[0].name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttrPath(SmallVec<[Segment; 4]>);

impl AttrPath {
    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Path with a single segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<Segment>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(segment.into());
        Self(segments)
    }

    /// Build a path from any sequence of segment-like values
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Segment>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level key this path lives under
    ///
    /// `None` for the root path, or when the path starts with an index.
    #[inline]
    #[must_use]
    pub fn top_level_key(&self) -> Option<&str> {
        self.0.first().and_then(Segment::as_key)
    }

    /// Parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].iter().cloned().collect()))
        }
    }

    /// Last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Split into parent segments and last segment
    #[inline]
    #[must_use]
    pub fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.0.split_last()
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Append a segment in place
    #[inline]
    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    /// Path of the first `len` segments
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0.iter().take(len).cloned().collect())
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0[..] == other.0[..self.0.len()]
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }
}

impl Display for AttrPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for AttrPath {
    type Err = PathError;

    /// Parse `a.b[0].c` notation
    ///
    /// Keys may contain any character except `.`, `[` and `]`; paths whose
    /// keys need those characters are built with [`AttrPath::from_segments`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = SmallVec::new();
        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if name.contains(']') {
                return Err(PathError::UnbalancedBracket(part.to_string()));
            }
            if name.is_empty() && rest.is_empty() {
                return Err(PathError::EmptySegment);
            }
            if !name.is_empty() {
                segments.push(Segment::Key(name.to_string()));
            }
            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| PathError::UnbalancedBracket(part.to_string()))?;
                let digits = &rest[1..close];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| PathError::InvalidIndex(digits.to_string()))?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(PathError::UnbalancedBracket(part.to_string()));
                }
            }
        }

        Ok(Self(segments))
    }
}

impl From<Vec<Segment>> for AttrPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self(SmallVec::from_vec(segments))
    }
}

impl From<&[Segment]> for AttrPath {
    fn from(segments: &[Segment]) -> Self {
        Self(segments.iter().cloned().collect())
    }
}

impl<'a> IntoIterator for &'a AttrPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build an [`AttrPath`] from segment-like expressions
///
/// ```
/// use strata_value::{attr_path, Segment};
/// let path = attr_path!["packages", 0usize, "name"];
/// assert_eq!(path.to_string(), "packages[0].name");
/// assert_eq!(path.segments()[1], Segment::Index(0));
/// ```
#[macro_export]
macro_rules! attr_path {
    () => {
        $crate::AttrPath::root()
    };
    ($($segment:expr),+ $(,)?) => {
        $crate::AttrPath::from(vec![$($crate::Segment::from($segment)),+])
    };
}

/// Errors related to attribute paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Index that is not a non-negative integer
    #[error("invalid index: '{0}' (must be a non-negative integer)")]
    InvalidIndex(String),

    /// Bracket without partner
    #[error("unbalanced bracket in segment: '{0}'")]
    UnbalancedBracket(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_single_and_root() {
        let path = AttrPath::single("only");
        assert_eq!(path.segments(), &[Segment::Key("only".into())]);
        assert!(AttrPath::root().is_empty());
        assert_eq!(AttrPath::root().len(), 0);
    }

    #[test]
    fn symbol_segments_are_canonical() {
        let a = AttrPath::single(Symbol::new("a"));
        let b = AttrPath::single("a");
        assert_eq!(a, b);
    }

    #[test]
    fn path_parent_and_last() {
        let path = attr_path!["a", "b", "c"];
        assert_eq!(path.parent().unwrap(), attr_path!["a", "b"]);
        assert_eq!(path.last(), Some(&Segment::Key("c".into())));
        assert!(AttrPath::root().parent().is_none());
    }

    #[test]
    fn path_top_level_key() {
        assert_eq!(attr_path!["net", 0usize].top_level_key(), Some("net"));
        assert_eq!(attr_path![0usize].top_level_key(), None);
        assert_eq!(AttrPath::root().top_level_key(), None);
    }

    #[test]
    fn path_child_and_prefix() {
        let parent = AttrPath::single("parent");
        let child = parent.child("child");
        assert_eq!(child.to_string(), "parent.child");
        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert_eq!(child.prefix(1), parent);
    }

    #[test]
    fn path_display_with_indices() {
        let path = attr_path!["packages", 2usize, "name"];
        assert_eq!(path.to_string(), "packages[2].name");
    }

    #[test]
    fn path_from_str_keys_and_indices() {
        let path: AttrPath = "packages[2].name".parse().unwrap();
        assert_eq!(path, attr_path!["packages", 2usize, "name"]);

        let nested: AttrPath = "matrix[0][1]".parse().unwrap();
        assert_eq!(nested, attr_path!["matrix", 0usize, 1usize]);
    }

    #[test]
    fn path_from_str_allows_dashes() {
        let path: AttrPath = "network.ip-address".parse().unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn path_from_str_empty() {
        let path: AttrPath = "".parse().unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn path_from_str_errors() {
        assert_eq!("a..b".parse::<AttrPath>(), Err(PathError::EmptySegment));
        assert!(matches!(
            "a[x]".parse::<AttrPath>(),
            Err(PathError::InvalidIndex(_))
        ));
        assert!(matches!(
            "a[1".parse::<AttrPath>(),
            Err(PathError::UnbalancedBracket(_))
        ));
        assert!(matches!(
            "a]".parse::<AttrPath>(),
            Err(PathError::UnbalancedBracket(_))
        ));
    }

    #[test]
    fn path_roundtrips_through_display() {
        let path = attr_path!["a", 0usize, "b", 3usize, 4usize];
        let parsed: AttrPath = path.to_string().parse().unwrap();
        assert_eq!(parsed, path);
    }

    fn any_segment() -> impl proptest::strategy::Strategy<Value = Segment> {
        use proptest::prelude::*;
        prop_oneof![
            "[a-z_][a-z0-9_]{0,7}".prop_map(Segment::Key),
            (0usize..64).prop_map(Segment::Index),
        ]
    }

    proptest::proptest! {
        #[test]
        fn prop_display_parses_back(
            segments in proptest::collection::vec(any_segment(), 1..6),
        ) {
            let path = AttrPath::from(segments);
            let parsed: AttrPath = path.to_string().parse().unwrap();
            proptest::prop_assert_eq!(parsed, path);
        }
    }
}
