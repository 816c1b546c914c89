//! Deep-merge engine
//!
//! Pure functions that fold the values found at one path across an ordered
//! list of layers (lowest precedence first) into a single fresh tree. The
//! output never shares structure with the inputs.

use crate::strategy::MergeStrategy;
use strata_value::{AttrPath, Canonicalize, Mapping, Segment, Value};

/// Value stored at `path` inside a layer, without creating anything
///
/// The root path addresses no single value and yields `None`.
#[must_use]
pub fn lookup<'a>(root: &'a Mapping, path: &AttrPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let Segment::Key(key) = first else {
        return None;
    };
    rest.iter()
        .try_fold(root.get(key)?, |value, segment| value.child(segment))
}

/// Fold present values, lowest precedence first
///
/// The first value is deep-copied; each later value is merged onto the
/// running result with `strategy`. Returns `None` when no value is present.
pub fn merge_layers<'a, I>(values: I, strategy: &dyn MergeStrategy) -> Option<Value>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().fold(None, |acc, value| {
        Some(match acc {
            None => value.clone(),
            Some(acc) => strategy.merge(acc, value),
        })
    })
}

/// Merge the values found at `path` in each layer
///
/// Layers lacking the path are skipped. Deferred values are left unforced.
pub fn merge_at<'a, I>(layers: I, path: &AttrPath, strategy: &dyn MergeStrategy) -> Option<Value>
where
    I: IntoIterator<Item = &'a Mapping>,
{
    merge_layers(
        layers.into_iter().filter_map(|layer| lookup(layer, path)),
        strategy,
    )
}

/// Merge one top-level key across layers and force the result
///
/// The returned tree contains no deferred values.
pub fn merge_key<'a, I>(
    layers: I,
    key: impl Canonicalize,
    strategy: &dyn MergeStrategy,
) -> Option<Value>
where
    I: IntoIterator<Item = &'a Mapping>,
{
    let path = AttrPath::single(Segment::Key(key.canonicalize()));
    merge_at(layers, &path, strategy).map(Value::into_concrete)
}

/// Layers that pre-combine with their own strategy before taking a slot
#[derive(Debug, Clone)]
pub struct LayerGroup<'a> {
    /// Layers in ascending precedence
    pub layers: Vec<&'a Mapping>,
    /// Strategy used between the layers of this group
    pub strategy: &'a dyn MergeStrategy,
}

impl<'a> LayerGroup<'a> {
    /// Create group
    #[inline]
    #[must_use]
    pub fn new(layers: Vec<&'a Mapping>, strategy: &'a dyn MergeStrategy) -> Self {
        Self { layers, strategy }
    }

    /// Merge this group alone at `path`
    #[must_use]
    pub fn merge_at(&self, path: &AttrPath) -> Option<Value> {
        merge_at(self.layers.iter().copied(), path, self.strategy)
    }
}

/// Two-phase merge: each group pre-combines, then groups fold with `between`
///
/// Deferred values are left unforced; callers force the final result.
#[must_use]
pub fn merge_groups(
    groups: &[LayerGroup<'_>],
    path: &AttrPath,
    between: &dyn MergeStrategy,
) -> Option<Value> {
    groups
        .iter()
        .filter_map(|group| group.merge_at(path))
        .fold(None, |acc, value| {
            Some(match acc {
                None => value,
                Some(acc) => between.merge(acc, &value),
            })
        })
}
