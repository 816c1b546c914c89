//! Attribute value model
//!
//! [`Value`] is a closed tagged union: a leaf [`Scalar`], a [`Mapping`], a
//! [`Sequence`] or a [`Deferred`] computation. Merge code branches on the
//! tag, never on a capability probe.

use crate::deferred::Deferred;
use crate::key::Canonicalize;
use crate::mapping::{Mapping, Sequence};
use crate::path::{AttrPath, Segment};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};

/// Leaf value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    /// Explicit null; present, and replaces lower-precedence values
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// Structural kind of a value, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Nothing stored at this location
    Absent,
    /// Scalar leaf
    Leaf,
    /// Key/value mapping
    Mapping,
    /// Ordered sequence
    Sequence,
    /// Unforced computation
    Deferred,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Leaf => "leaf",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::Deferred => "deferred",
        };
        f.write_str(name)
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scalar leaf
    Leaf(Scalar),
    /// Nested canonical mapping
    Mapping(Mapping),
    /// Nested canonical sequence
    Sequence(Sequence),
    /// Lazily computed value
    Deferred(Deferred),
}

impl Default for Value {
    fn default() -> Self {
        Self::Leaf(Scalar::Null)
    }
}

impl Value {
    /// Explicit null leaf
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self::Leaf(Scalar::Null)
    }

    /// Wrap a computation as a deferred value
    #[inline]
    #[must_use]
    pub fn deferred<F>(compute: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Deferred(Deferred::new(compute))
    }

    /// Structural kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Mapping(_) => NodeKind::Mapping,
            Self::Sequence(_) => NodeKind::Sequence,
            Self::Deferred(_) => NodeKind::Deferred,
        }
    }

    /// Whether this is a mapping
    #[inline]
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// Whether this is a sequence
    #[inline]
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// Whether this is an explicit null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Leaf(Scalar::Null))
    }

    /// Mapping view
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mutable mapping view
    #[inline]
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Sequence view
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable sequence view
    #[inline]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar view
    #[inline]
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Leaf(s) => Some(s),
            _ => None,
        }
    }

    /// String leaf
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Leaf(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer leaf
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Leaf(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Numeric leaf as float
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Leaf(Scalar::Float(x)) => Some(*x),
            Self::Leaf(Scalar::Integer(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// Boolean leaf
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Leaf(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Mapping entry by key (canonicalized)
    #[inline]
    #[must_use]
    pub fn get(&self, key: impl Canonicalize) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Child addressed by one path segment
    ///
    /// Keys only address mappings and indices only address sequences;
    /// anything else yields `None`.
    #[must_use]
    pub fn child(&self, segment: &Segment) -> Option<&Value> {
        match (self, segment) {
            (Self::Mapping(m), Segment::Key(k)) => m.get(k),
            (Self::Sequence(s), Segment::Index(i)) => s.get(*i),
            _ => None,
        }
    }

    /// Mutable child addressed by one path segment
    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Value> {
        match (self, segment) {
            (Self::Mapping(m), Segment::Key(k)) => m.get_mut(k),
            (Self::Sequence(s), Segment::Index(i)) => s.get_mut(*i),
            _ => None,
        }
    }

    /// Descend along a path without creating anything
    ///
    /// Walking off the end of a container, or applying a segment to a
    /// leaf, yields `None` rather than an error.
    #[must_use]
    pub fn resolve(&self, path: &AttrPath) -> Option<&Value> {
        path.iter().try_fold(self, |value, segment| value.child(segment))
    }

    /// Force every deferred value in this tree
    #[must_use]
    pub fn into_concrete(self) -> Value {
        match self {
            Self::Deferred(d) => d.force(),
            Self::Mapping(m) => Self::Mapping(m.into_concrete()),
            Self::Sequence(s) => Self::Sequence(s.into_concrete()),
            leaf @ Self::Leaf(_) => leaf,
        }
    }

    /// Whether the tree contains no deferred values
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Deferred(_) => false,
            Self::Mapping(m) => m.values().all(Value::is_concrete),
            Self::Sequence(s) => s.iter().all(Value::is_concrete),
            Self::Leaf(_) => true,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(s) => write!(f, "{s}"),
            Self::Mapping(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Sequence(s) => {
                f.write_str("[")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Self::Deferred(_) => f.write_str("<deferred>"),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Leaf(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Leaf(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Leaf(Scalar::Integer(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Leaf(Scalar::Integer(i64::from(i)))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Leaf(Scalar::Integer(i64::from(i)))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Leaf(Scalar::Float(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Leaf(Scalar::String(s.to_owned()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Leaf(Scalar::String(s))
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Self::Mapping(m)
    }
}

impl From<Sequence> for Value {
    fn from(s: Sequence) -> Self {
        Self::Sequence(s)
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or_else(Value::null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }
}

impl<K: Canonicalize, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(map: HashMap<K, V>) -> Self {
        Self::Mapping(map.into_iter().collect())
    }
}

impl<K: Canonicalize, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::Mapping(map.into_iter().collect())
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self.as_i64() == Some(i64::from(*other))
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}
