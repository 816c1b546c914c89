//! Strata Value Model
//!
//! Canonical containers for layered attribute data.
//!
//! # Core Concepts
//!
//! - [`Value`]: Closed tagged union of leaf, mapping, sequence and deferred values
//! - [`Mapping`]: Insertion-ordered map whose keys are always canonical
//! - [`Sequence`]: Ordered list of values, duplicates allowed
//! - [`Deferred`]: Zero-argument computation forced when a merge surfaces it
//! - [`Canonicalize`]: Folds symbol-like and string keys into one form
//! - [`AttrPath`]: Hierarchical addressing of nested values
//!
//! # Example
//!
//! ```rust
//! use strata_value::{attr_path, Mapping, Symbol, Value};
//!
//! let mut nginx = Mapping::new();
//! nginx.insert(Symbol::new("port"), 80);
//!
//! let mut root = Mapping::new();
//! root.insert("nginx", nginx);
//!
//! let root = Value::from(root);
//! assert_eq!(root.resolve(&attr_path!["nginx", "port"]), Some(&Value::from(80)));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod codec;
mod deferred;
mod key;
mod mapping;
mod path;
mod value;

pub use codec::ValueError;
pub use deferred::Deferred;
pub use key::{Canonicalize, Symbol};
pub use mapping::{Mapping, Sequence};
pub use path::{AttrPath, PathError, Segment};
pub use value::{NodeKind, Scalar, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
