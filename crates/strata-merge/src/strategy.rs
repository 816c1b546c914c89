//! Merge strategy trait and built-in strategies
//!
//! Provides the [`MergeStrategy`] trait that decides how two values meeting
//! at the same location combine. Every strategy shares the same skeleton:
//! mappings recurse key by key, everything else is replaced by the higher
//! precedence value. Strategies differ only in how two sequences combine.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use strata_value::{Sequence, Value};

/// Precedence-aware combination of two values
///
/// # Determinism
/// `merge` must be a pure function of its inputs; the merge cache relies on
/// recomputation producing an equal result.
pub trait MergeStrategy: Send + Sync + fmt::Debug {
    /// Combine two sequences found at the same location
    fn merge_sequences(&self, lower: Sequence, higher: &Sequence) -> Sequence;

    /// Strategy name (for debugging/configuration)
    fn name(&self) -> &'static str;

    /// Merge `higher` onto `lower`, consuming `lower`
    ///
    /// - both mappings: union of keys, recursing where both sides hold a value
    /// - both sequences: [`MergeStrategy::merge_sequences`]
    /// - anything else (scalars, nulls, deferred values, mismatched kinds):
    ///   `higher` replaces `lower` wholesale
    fn merge(&self, lower: Value, higher: &Value) -> Value {
        match (lower, higher) {
            (Value::Mapping(mut ours), Value::Mapping(theirs)) => {
                for (key, incoming) in theirs {
                    match ours.get_mut(key) {
                        Some(slot) => {
                            let existing = std::mem::take(slot);
                            *slot = self.merge(existing, incoming);
                        }
                        None => {
                            ours.insert(key, incoming.clone());
                        }
                    }
                }
                Value::Mapping(ours)
            }
            (Value::Sequence(ours), Value::Sequence(theirs)) => {
                Value::Sequence(self.merge_sequences(ours, theirs))
            }
            (_, higher) => higher.clone(),
        }
    }
}

/// Mapping-only deep merge
///
/// Sequences are never concatenated: the higher precedence sequence wholly
/// replaces the lower one. This is the rule between precedence slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashOnlyMerge;

impl HashOnlyMerge {
    /// Create new hash-only strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MergeStrategy for HashOnlyMerge {
    fn merge_sequences(&self, _lower: Sequence, higher: &Sequence) -> Sequence {
        higher.clone()
    }

    fn name(&self) -> &'static str {
        "HashOnly"
    }
}

/// Deep merge with sequence union
///
/// Sequences combine as an order-preserving union without duplicates,
/// lower precedence items first.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionMerge;

impl UnionMerge {
    /// Create new union strategy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MergeStrategy for UnionMerge {
    fn merge_sequences(&self, lower: Sequence, higher: &Sequence) -> Sequence {
        lower.union(higher)
    }

    fn name(&self) -> &'static str {
        "Union"
    }
}

static HASH_ONLY: HashOnlyMerge = HashOnlyMerge;
static UNION: UnionMerge = UnionMerge;

/// Named choice of sequence handling, for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceMerge {
    /// Higher precedence sequence replaces the lower one
    #[default]
    Replace,
    /// Order-preserving union without duplicates
    Union,
}

impl SequenceMerge {
    /// Strategy implementing this choice
    #[inline]
    #[must_use]
    pub fn strategy(self) -> &'static dyn MergeStrategy {
        match self {
            Self::Replace => &HASH_ONLY,
            Self::Union => &UNION,
        }
    }

    /// Configuration name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Union => "union",
        }
    }
}

impl Display for SequenceMerge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SequenceMerge {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "union" => Ok(Self::Union),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Unrecognised strategy name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sequence merge strategy: '{0}' (expected 'replace' or 'union')")]
pub struct UnknownStrategy(pub String);
