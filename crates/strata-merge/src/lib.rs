//! Strata Merge Engine
//!
//! Deterministic deep merge of attribute trees ordered by precedence.
//!
//! # Core Concepts
//!
//! - [`MergeStrategy`]: How two values meeting at one location combine
//! - [`HashOnlyMerge`]: Mappings recurse, sequences and scalars replace
//! - [`UnionMerge`]: Like hash-only, but sequences union
//! - [`merge_at`] / [`merge_key`]: Fold one path across ordered layers
//! - [`LayerGroup`] / [`merge_groups`]: Pre-combine layers inside a slot,
//!   then merge slots
//!
//! # Example
//!
//! ```rust
//! use strata_merge::{merge_key, HashOnlyMerge};
//! use strata_value::{Mapping, Value};
//!
//! let mut default = Mapping::new();
//! default.insert("port", 80);
//! let mut automatic = Mapping::new();
//! automatic.insert("port", 8080);
//!
//! let merged = merge_key([&default, &automatic], "port", &HashOnlyMerge);
//! assert_eq!(merged, Some(Value::from(8080)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod engine;
mod strategy;

pub use engine::{lookup, merge_at, merge_groups, merge_key, merge_layers, LayerGroup};
pub use strategy::{HashOnlyMerge, MergeStrategy, SequenceMerge, UnionMerge, UnknownStrategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
