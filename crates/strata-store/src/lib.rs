//! Strata Attribute Store
//!
//! Layered configuration state: several precedence levels, a cached deep
//! merge per top-level key, and level-scoped write-through accessors.
//!
//! # Core Concepts
//!
//! - [`Level`]: Ten precedence levels grouped into four [`Slot`]s
//! - [`AttributeStore`]: Owns levels, merge cache and change notifier
//! - [`MergedView`]: Immutable snapshot of a merged attribute
//! - [`LevelView`]: Writable accessor bound to one level
//! - [`MergeCache`]: Per-store memo of merge results, invalidated on write
//! - [`ChangeListener`]: Synchronous receiver of [`ChangeEvent`]s
//! - [`StoreConfig`]: Levels, cache capacity and slot sequence handling
//!
//! # Example
//!
//! ```rust
//! use strata_store::{AttrWrite, AttributeStore, Level};
//! use strata_value::attr_path;
//!
//! let mut store = AttributeStore::new();
//! store.level(Level::Default)?.at("nginx").insert("port", 80)?;
//! store.level(Level::Override)?.at("nginx").insert("port", 8080)?;
//!
//! let port = store.read_path(&attr_path!["nginx", "port"]).unwrap();
//! assert_eq!(port.as_i64(), Some(8080));
//!
//! // merged views are read-only
//! let mut nginx = store.read("nginx").unwrap();
//! assert!(nginx.insert("port", 1).is_err());
//! # Ok::<(), strata_store::AttrError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod cache;
mod config;
mod error;
mod level;
mod notify;
mod store;
mod tree;
mod view;

pub use cache::{CacheStats, MergeCache};
pub use config::{StoreConfig, DEFAULT_CACHE_CAPACITY};
pub use error::{AttrError, AttrResult, CoherenceViolation, ConfigError, ListenerError};
pub use level::{Level, Slot};
pub use notify::{ChangeEvent, ChangeListener, ListenerId, Notifier};
pub use store::AttributeStore;
pub use view::{AttrWrite, LevelView, MergedView, PathAware, Precedence};

pub use strata_merge::SequenceMerge;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use strata_value::{attr_path, Mapping, Symbol, Value};

    fn mapping(json: serde_json::Value) -> Mapping {
        match Value::from(json) {
            Value::Mapping(m) => m,
            _ => Mapping::new(),
        }
    }

    #[test]
    fn loaded_levels_merge_recursively() {
        let mut store = AttributeStore::new();
        store
            .replace_level(
                Level::Default,
                Mapping::from_yaml_str("nginx:\n  port: 80\n  workers: 4\n").unwrap(),
            )
            .unwrap();
        store
            .replace_level(
                Level::Override,
                Mapping::from_json_str(r#"{"nginx": {"port": 8080}}"#).unwrap(),
            )
            .unwrap();

        let nginx = store.read(Symbol::new("nginx")).unwrap();
        assert_eq!(nginx.to_owned_value(), Value::from(json!({"port": 8080, "workers": 4})));
    }

    #[test]
    fn union_mode_combines_default_sub_levels() {
        let config = StoreConfig::new().with_slot_sequences(SequenceMerge::Union);
        let mut store = AttributeStore::with_config(config).unwrap();
        store
            .replace_level(Level::Default, mapping(json!({"pkgs": ["curl"]})))
            .unwrap();
        store
            .replace_level(Level::RoleDefault, mapping(json!({"pkgs": ["git", "curl"]})))
            .unwrap();
        store
            .replace_level(Level::Normal, mapping(json!({"other": 1})))
            .unwrap();

        assert_eq!(
            store.read("pkgs").unwrap().to_owned_value(),
            Value::from(vec!["curl", "git"])
        );

        // between slots sequences still replace
        store
            .set(Level::Override, &attr_path!["pkgs"], vec!["vim"])
            .unwrap();
        assert_eq!(
            store.read("pkgs").unwrap().to_owned_value(),
            Value::from(vec!["vim"])
        );
    }

    #[test]
    fn merged_snapshot_of_whole_store() {
        let mut store = AttributeStore::new();
        store.set(Level::Default, &attr_path!["a", "x"], 1).unwrap();
        store.set(Level::Automatic, &attr_path!["b"], "fact").unwrap();
        assert_eq!(
            Value::from(store.merged()),
            Value::from(json!({"a": {"x": 1}, "b": "fact"}))
        );
    }
}
