//! Functional tests for merge cache coherence.
//!
//! After any sequence of writes, every read served from the cache equals a
//! fresh merge of the current level data. Invalidation is per top-level key
//! for nested writes and total for root-level replacements.

use proptest::prelude::*;
use serde_json::json;
use strata_store::{AttrWrite, AttributeStore, Level};
use strata_test_utils::{init_tracing, mapping, web_host_store};
use strata_value::{attr_path, AttrPath, Value};

/// Tenet: a write is visible to the very next read.
///
/// Reading caches the merge of `nginx`; an override write beneath it must
/// drop that entry so the next read recomputes.
#[test]
fn write_invalidates_cached_merge() {
    init_tracing();
    let mut store = web_host_store();

    assert_eq!(store.read_path(&attr_path!["nginx", "port"]).unwrap().as_i64(), Some(8080));
    assert!(store.cache().contains("nginx"));

    store
        .set(Level::ForceOverride, &attr_path!["nginx", "port"], 9090)
        .unwrap();
    assert!(!store.cache().contains("nginx"));
    assert_eq!(store.read_path(&attr_path!["nginx", "port"]).unwrap().as_i64(), Some(9090));
    store.verify_coherence().unwrap();
}

/// Tenet: invalidation is scoped to the written top-level key.
#[test]
fn unrelated_entries_survive_point_invalidation() {
    let mut store = web_host_store();
    let _ = store.read("nginx");
    let _ = store.read("cpu");

    store.set(Level::Normal, &attr_path!["nginx", "user"], "nobody").unwrap();

    assert!(!store.cache().contains("nginx"));
    assert!(store.cache().contains("cpu"));
    store.verify_coherence().unwrap();
}

/// Tenet: replacing a whole level drops every cached merge.
#[test]
fn level_replacement_invalidates_everything() {
    let mut store = web_host_store();
    let _ = store.read("nginx");
    let _ = store.read("platform");

    store
        .replace_automatic(mapping(json!({"platform": "freebsd"})))
        .unwrap();

    assert!(!store.cache().contains("nginx"));
    assert!(!store.cache().contains("platform"));
    assert_eq!(store.read("platform").unwrap().as_str(), Some("freebsd"));
    assert!(store.read("cpu").is_none());
}

/// Tenet: clearing a level root through a view is a total invalidation.
#[test]
fn clearing_level_root_invalidates_everything() {
    let mut store = web_host_store();
    let _ = store.read("nginx");
    let _ = store.read("packages");

    store.level(Level::Default).unwrap().clear().unwrap();

    assert!(!store.cache().contains("packages"));
    assert!(store.read("packages").is_none());
    assert_eq!(
        store.read("nginx").unwrap().to_owned_value(),
        Value::from(json!({"port": 8080, "user": "www"}))
    );
}

/// Tenet: repeated reads without writes are served from the cache.
#[test]
fn repeated_reads_hit_the_cache() {
    let store = web_host_store();
    let first = store.read("nginx").unwrap();
    let second = store.read("nginx").unwrap();
    assert_eq!(first, second);

    let stats = store.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.entry_count, 1);
}

/// Tenet: the public cache handle can drop entries but never fill them.
///
/// Whatever a caller does through `cache()`, the next read is a fresh merge
/// of the level data.
#[test]
fn cache_handle_only_drops_entries() {
    let mut store = AttributeStore::new();
    store.set(Level::Default, &attr_path!["a"], 1).unwrap();
    let _ = store.read("a");

    let cache = store.cache();
    assert_eq!(cache.get("a").as_deref(), Some(&Value::from(1)));
    cache.invalidate("a");
    assert!(!cache.contains("a"));

    assert_eq!(store.read("a").unwrap().as_i64(), Some(1));
    store.cache().invalidate_all();
    store.verify_coherence().unwrap();
    assert_eq!(store.read("a").unwrap().as_i64(), Some(1));
}

/// Tenet: absent keys are not cached, so a later write is always seen.
#[test]
fn absence_is_not_cached() {
    let mut store = AttributeStore::new();
    assert!(store.read("late").is_none());
    assert!(!store.cache().contains("late"));

    store.set(Level::Default, &attr_path!["late"], true).unwrap();
    assert_eq!(store.read("late").unwrap().as_bool(), Some(true));
}

/// Tenet: views outlive writes but report when they are stale.
#[test]
fn stale_views_are_detectable() {
    let mut store = web_host_store();
    let before = store.read("nginx").unwrap();
    assert!(store.is_current(&before));

    store.set(Level::Normal, &attr_path!["nginx", "port"], 1).unwrap();
    assert!(!store.is_current(&before));
    // the old snapshot still shows what was merged when it was taken
    assert_eq!(before.get("port").unwrap().as_i64(), Some(8080));
}

#[derive(Debug, Clone)]
enum Op {
    Set(Level, AttrPath, i64),
    Push(Level, AttrPath, i64),
    Unlink(Level, AttrPath),
    Rm(AttrPath),
    ForceOverride(AttrPath, i64),
    Replace(Level, i64),
    Read(AttrPath),
}

fn any_level() -> impl Strategy<Value = Level> {
    proptest::sample::select(Level::ALL.to_vec())
}

fn any_path() -> impl Strategy<Value = AttrPath> {
    let keys = proptest::sample::select(vec!["a", "b", "c"]);
    proptest::collection::vec(keys, 1..4).prop_map(|segments| {
        segments
            .into_iter()
            .fold(AttrPath::root(), |path, key| path.child(key))
    })
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any_level(), any_path(), any::<i64>()).prop_map(|(l, p, v)| Op::Set(l, p, v)),
        (any_level(), any_path(), any::<i64>()).prop_map(|(l, p, v)| Op::Push(l, p, v)),
        (any_level(), any_path()).prop_map(|(l, p)| Op::Unlink(l, p)),
        any_path().prop_map(Op::Rm),
        (any_path(), any::<i64>()).prop_map(|(p, v)| Op::ForceOverride(p, v)),
        (any_level(), any::<i64>()).prop_map(|(l, v)| Op::Replace(l, v)),
        any_path().prop_map(Op::Read),
    ]
}

/// Apply one op; type conflicts are expected and leave the store unchanged
fn apply(store: &mut AttributeStore, op: &Op) {
    let _ = match op {
        Op::Set(level, path, v) => store.set(*level, path, *v),
        Op::Push(level, path, v) => store.push(*level, path, *v),
        Op::Unlink(level, path) => store.unlink(*level, path).map(drop),
        Op::Rm(path) => store.rm(path).map(drop),
        Op::ForceOverride(path, v) => store.force_override(path, *v),
        Op::Replace(level, v) => store
            .replace_level(*level, mapping(json!({"a": {"b": v}})))
            .map(drop),
        Op::Read(path) => {
            let _ = store.read_path(path);
            Ok(())
        }
    };
}

proptest! {
    /// Tenet: cached reads always equal a fresh merge.
    ///
    /// A store that reads between every op (so its cache is hot) must agree
    /// with a twin that only reads at the end, and its cache must verify.
    #[test]
    fn prop_cache_matches_fresh_merge(ops in proptest::collection::vec(any_op(), 1..40)) {
        let mut hot = AttributeStore::new();
        let mut cold = AttributeStore::new();
        for op in &ops {
            apply(&mut hot, op);
            apply(&mut cold, op);
            for key in ["a", "b", "c"] {
                let _ = hot.read(key);
            }
            prop_assert!(hot.verify_coherence().is_ok());
        }
        for key in ["a", "b", "c"] {
            prop_assert_eq!(
                hot.read(key).map(|v| v.to_owned_value()),
                cold.read(key).map(|v| v.to_owned_value())
            );
        }
    }
}
