//! Path-tracking views
//!
//! Two views exist. A [`MergedView`] is a snapshot of a merge result and
//! refuses every mutation. A [`LevelView`] is bound to one precedence level
//! and writes through to the store at the path it has accumulated. Both
//! remember their path from the root, so a write several segments deep
//! knows exactly where it lands.

use crate::error::{AttrError, AttrResult};
use crate::level::Level;
use crate::store::AttributeStore;
use serde::{Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use strata_merge::lookup;
use strata_value::{AttrPath, Mapping, NodeKind, Segment, Value};

static NULL: Value = Value::null();

/// Precedence a view is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precedence {
    /// Merged across every level; read-only
    Merged,
    /// A single level; writable
    Level(Level),
}

impl Precedence {
    /// Bound level, if any
    #[inline]
    #[must_use]
    pub fn level(self) -> Option<Level> {
        match self {
            Self::Merged => None,
            Self::Level(level) => Some(level),
        }
    }

    /// Whether writes through this precedence are allowed
    #[inline]
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Level(_))
    }
}

/// A view that knows where it sits in the attribute tree
pub trait PathAware {
    /// Path from the root
    fn path(&self) -> &AttrPath;

    /// Level the view writes to, or [`Precedence::Merged`]
    fn precedence(&self) -> Precedence;

    /// Top-level key whose cache entry a write here invalidates
    fn top_level_key(&self) -> Option<&str> {
        self.path().top_level_key()
    }
}

/// Mutation through a view
///
/// Every method addresses locations relative to the view's own path.
pub trait AttrWrite {
    /// Store `value` under `key` (auto-vivifying missing mappings)
    ///
    /// # Errors
    /// `ImmutableWrite` on merged views; `TypeConflict` or
    /// `IndexOutOfBounds` when the path cannot hold the value
    fn insert(&mut self, key: impl Into<Segment>, value: impl Into<Value>) -> AttrResult<()>;

    /// Append to the sequence at this view's path (creating it if absent)
    ///
    /// # Errors
    /// `ImmutableWrite` on merged views; `TypeConflict` if a non-sequence
    /// is stored here
    fn push(&mut self, value: impl Into<Value>) -> AttrResult<()>;

    /// Remove the value under `key`
    ///
    /// # Errors
    /// `ImmutableWrite` on merged views
    fn remove(&mut self, key: impl Into<Segment>) -> AttrResult<Option<Value>>;

    /// Empty the container at this view's path
    ///
    /// # Errors
    /// `ImmutableWrite` on merged views; `TypeConflict` if a leaf is stored
    /// here
    fn clear(&mut self) -> AttrResult<()>;
}

/// Read-only snapshot of a merged attribute
///
/// Cheap to clone: every view derived from one read shares the same merge
/// result. A view never changes after creation; use
/// [`AttributeStore::is_current`] to tell whether the store has moved on.
#[derive(Debug, Clone)]
pub struct MergedView {
    root: Arc<Value>,
    path: AttrPath,
    serial: u64,
}

impl MergedView {
    /// View at `path` of the merge result `root` for `path`'s top-level key
    ///
    /// `None` if nothing exists at `path`.
    pub(crate) fn locate(root: Arc<Value>, path: AttrPath, serial: u64) -> Option<Self> {
        let view = Self { root, path, serial };
        view.resolve().is_some().then_some(view)
    }

    fn resolve(&self) -> Option<&Value> {
        self.path
            .iter()
            .skip(1)
            .try_fold(&*self.root, |value, segment| value.child(segment))
    }

    /// Merged value at this view's path
    #[must_use]
    pub fn value(&self) -> &Value {
        self.resolve().unwrap_or(&NULL)
    }

    /// Child view, if the child exists
    #[must_use]
    pub fn get(&self, segment: impl Into<Segment>) -> Option<MergedView> {
        Self::locate(Arc::clone(&self.root), self.path.child(segment), self.serial)
    }

    /// Descendant view along a relative path
    #[must_use]
    pub fn at(&self, relative: &AttrPath) -> Option<MergedView> {
        let mut path = self.path.clone();
        for segment in relative {
            path.push(segment.clone());
        }
        Self::locate(Arc::clone(&self.root), path, self.serial)
    }

    /// Structural kind of the value
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.value().kind()
    }

    /// String leaf
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value().as_str()
    }

    /// Integer leaf
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.value().as_i64()
    }

    /// Numeric leaf as float
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.value().as_f64()
    }

    /// Boolean leaf
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value().as_bool()
    }

    /// Whether the merged value is an explicit null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value().is_null()
    }

    /// Keys of a mapping value (empty otherwise)
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.value().as_mapping().into_iter().flat_map(Mapping::keys)
    }

    /// Entries of a mapping value (empty otherwise)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value().as_mapping().into_iter().flat_map(Mapping::iter)
    }

    /// Number of children (0 for leaves)
    #[must_use]
    pub fn len(&self) -> usize {
        match self.value() {
            Value::Mapping(m) => m.len(),
            Value::Sequence(s) => s.len(),
            _ => 0,
        }
    }

    /// Whether the value has no children
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep copy the caller may mutate freely
    #[must_use]
    pub fn to_owned_value(&self) -> Value {
        self.value().clone()
    }

    /// Store serial this snapshot was taken at
    #[inline]
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl PathAware for MergedView {
    fn path(&self) -> &AttrPath {
        &self.path
    }

    fn precedence(&self) -> Precedence {
        Precedence::Merged
    }
}

impl AttrWrite for MergedView {
    fn insert(&mut self, key: impl Into<Segment>, _value: impl Into<Value>) -> AttrResult<()> {
        Err(AttrError::immutable_write(self.path.child(key)))
    }

    fn push(&mut self, _value: impl Into<Value>) -> AttrResult<()> {
        Err(AttrError::immutable_write(self.path.clone()))
    }

    fn remove(&mut self, key: impl Into<Segment>) -> AttrResult<Option<Value>> {
        Err(AttrError::immutable_write(self.path.child(key)))
    }

    fn clear(&mut self) -> AttrResult<()> {
        Err(AttrError::immutable_write(self.path.clone()))
    }
}

impl PartialEq for MergedView {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl PartialEq<Value> for MergedView {
    fn eq(&self, other: &Value) -> bool {
        self.value() == other
    }
}

impl Display for MergedView {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for MergedView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Writable accessor bound to one precedence level
///
/// Obtained from [`AttributeStore::level`]. Navigation with [`LevelView::at`]
/// never creates anything; missing containers are created only when a write
/// lands.
#[derive(Debug)]
pub struct LevelView<'s> {
    store: &'s mut AttributeStore,
    level: Level,
    path: AttrPath,
}

impl<'s> LevelView<'s> {
    pub(crate) fn new(store: &'s mut AttributeStore, level: Level, path: AttrPath) -> Self {
        Self { store, level, path }
    }

    /// Bound level
    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Descend one segment, consuming this view
    #[must_use]
    pub fn at(self, segment: impl Into<Segment>) -> LevelView<'s> {
        Self {
            path: self.path.child(segment),
            ..self
        }
    }

    /// Descend one segment, keeping this view usable afterwards
    #[must_use]
    pub fn child(&mut self, segment: impl Into<Segment>) -> LevelView<'_> {
        LevelView {
            store: &mut *self.store,
            level: self.level,
            path: self.path.child(segment),
        }
    }

    /// This level's value at the view's path (`None` at the root)
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        lookup(self.store.level_data(self.level).ok()?, &self.path)
    }

    /// This level's value under `key`
    #[must_use]
    pub fn get(&self, segment: impl Into<Segment>) -> Option<&Value> {
        lookup(self.store.level_data(self.level).ok()?, &self.path.child(segment))
    }

    /// Whether this level holds a value at the view's path
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.value().is_some()
    }

    /// Replace the value at the view's own path
    ///
    /// # Errors
    /// `EmptyPath` at the level root; otherwise as [`AttrWrite::insert`]
    pub fn set(&mut self, value: impl Into<Value>) -> AttrResult<()> {
        self.store.set(self.level, &self.path, value)
    }
}

impl PathAware for LevelView<'_> {
    fn path(&self) -> &AttrPath {
        &self.path
    }

    fn precedence(&self) -> Precedence {
        Precedence::Level(self.level)
    }
}

impl AttrWrite for LevelView<'_> {
    fn insert(&mut self, key: impl Into<Segment>, value: impl Into<Value>) -> AttrResult<()> {
        self.store.set(self.level, &self.path.child(key), value)
    }

    fn push(&mut self, value: impl Into<Value>) -> AttrResult<()> {
        self.store.push(self.level, &self.path, value)
    }

    fn remove(&mut self, key: impl Into<Segment>) -> AttrResult<Option<Value>> {
        self.store.unlink(self.level, &self.path.child(key))
    }

    fn clear(&mut self) -> AttrResult<()> {
        self.store.clear(self.level, &self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_value::attr_path;

    fn snapshot() -> MergedView {
        let root = Arc::new(Value::from(json!({"b": {"c": [1, 2]}, "s": "text"})));
        MergedView::locate(root, attr_path!["a"], 0).unwrap()
    }

    #[test]
    fn merged_view_navigates_children() {
        let view = snapshot();
        let seq = view.get("b").and_then(|b| b.get("c")).unwrap();
        assert_eq!(seq.path(), &attr_path!["a", "b", "c"]);
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(1usize).unwrap().as_i64(), Some(2));
        assert!(view.get("missing").is_none());
        assert_eq!(view.at(&attr_path!["s"]).unwrap().as_str(), Some("text"));
    }

    #[test]
    fn merged_view_rejects_every_write() {
        let mut view = snapshot();
        assert!(matches!(
            view.insert("x", 1),
            Err(AttrError::ImmutableWrite { path }) if path == attr_path!["a", "x"]
        ));
        assert!(matches!(view.push(1), Err(AttrError::ImmutableWrite { .. })));
        assert!(matches!(view.remove("b"), Err(AttrError::ImmutableWrite { .. })));
        assert!(matches!(view.clear(), Err(AttrError::ImmutableWrite { .. })));
        assert_eq!(view.precedence(), Precedence::Merged);
        assert!(!view.precedence().is_writable());
    }

    #[test]
    fn owned_copy_is_detached() {
        let view = snapshot();
        let mut copy = view.to_owned_value();
        if let Some(m) = copy.as_mapping_mut() {
            m.insert("s", "changed");
        }
        assert_eq!(view.get("s").unwrap().as_str(), Some("text"));
    }

    #[test]
    fn merged_view_serializes_its_value() {
        let view = snapshot();
        let json = serde_json::to_value(view.get("b").unwrap()).unwrap();
        assert_eq!(json, json!({"c": [1, 2]}));
    }
}
