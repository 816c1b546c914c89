//! The layered attribute store
//!
//! Owns the precedence levels, the merge cache and the notifier. Every
//! mutation goes through this type, which is what keeps the cache coherent:
//! a write beneath top-level key `k` drops `k`'s cache entry before the call
//! returns, and replacing or clearing a whole level drops every entry.

use crate::cache::{CacheStats, MergeCache};
use crate::config::StoreConfig;
use crate::error::{AttrError, AttrResult, CoherenceViolation, ConfigError};
use crate::level::{Level, Slot};
use crate::notify::{ChangeEvent, ChangeListener, ListenerId, Notifier};
use crate::tree;
use crate::view::{LevelView, MergedView};
use indexmap::IndexSet;
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_merge::{lookup, merge_groups, HashOnlyMerge, LayerGroup, MergeStrategy};
use strata_value::{AttrPath, Canonicalize, Mapping, NodeKind, Sequence, Value};
use tracing::{debug, trace};

/// Precedence-ordered attribute store
///
/// Reads return [`MergedView`] snapshots of the deep merge of every level;
/// writes go through [`LevelView`] accessors or the level-scoped methods
/// below. There is deliberately no unscoped write.
#[derive(Debug)]
pub struct AttributeStore {
    config: StoreConfig,
    levels: BTreeMap<Level, Mapping>,
    cache: MergeCache,
    notifier: Notifier,
    serial: u64,
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeStore {
    /// Create store with every level configured
    #[must_use]
    pub fn new() -> Self {
        Self::build(StoreConfig::default())
    }

    /// Create store from configuration
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub fn with_config(config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Self {
        let levels = config
            .levels
            .iter()
            .map(|level| (*level, Mapping::new()))
            .collect();
        let cache = MergeCache::new(config.cache_capacity);
        Self {
            config,
            levels,
            cache,
            notifier: Notifier::new(),
            serial: 0,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Configured levels in rank order
    pub fn configured_levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.keys().copied()
    }

    /// Raw data of one level
    ///
    /// # Errors
    /// `UnknownLevel` if the level is not configured
    pub fn level_data(&self, level: Level) -> AttrResult<&Mapping> {
        self.levels.get(&level).ok_or_else(|| unknown(level))
    }

    fn level_data_mut(&mut self, level: Level) -> AttrResult<&mut Mapping> {
        self.levels.get_mut(&level).ok_or_else(|| unknown(level))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Merged value of a top-level key
    ///
    /// Served from the cache when possible. `None` if no level defines `key`.
    #[must_use]
    pub fn read(&self, key: impl Canonicalize) -> Option<MergedView> {
        self.read_path(&AttrPath::single(key.canonicalize()))
    }

    /// Merged value at a nested path
    #[must_use]
    pub fn read_path(&self, path: &AttrPath) -> Option<MergedView> {
        let key = path.top_level_key()?;
        let root = self.merged_root(key)?;
        MergedView::locate(root, path.clone(), self.serial)
    }

    /// Merged value at a path that must exist
    ///
    /// # Errors
    /// `NotFound` if nothing is stored at `path`
    pub fn read_required(&self, path: &AttrPath) -> AttrResult<MergedView> {
        self.read_path(path)
            .ok_or_else(|| AttrError::NotFound(path.clone()))
    }

    /// Whether a merged value exists at `path`
    #[must_use]
    pub fn exists(&self, path: &AttrPath) -> bool {
        self.read_path(path).is_some()
    }

    /// Whether any level defines the top-level `key`
    #[must_use]
    pub fn contains_key(&self, key: impl Canonicalize) -> bool {
        let key = key.canonicalize();
        self.levels.values().any(|data| data.contains_key(&key))
    }

    /// Every top-level key once, in order of first appearance by rank
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let keys: IndexSet<&str> = self.levels.values().flat_map(Mapping::keys).collect();
        keys.into_iter()
    }

    /// Top-level keys paired with their merged views
    pub fn iter(&self) -> impl Iterator<Item = (&str, MergedView)> + '_ {
        self.keys()
            .filter_map(move |key| self.read(key).map(|view| (key, view)))
    }

    /// Number of distinct top-level keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// Whether no level holds any data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.values().all(Mapping::is_empty)
    }

    /// Owned deep copy of the whole merged tree
    #[must_use]
    pub fn merged(&self) -> Mapping {
        self.iter()
            .map(|(key, view)| (key, view.to_owned_value()))
            .collect()
    }

    /// Merge of the default sub-levels alone
    #[must_use]
    pub fn combined_default(&self, path: &AttrPath) -> Option<Value> {
        self.slot_group(Slot::Default)
            .merge_at(path)
            .map(Value::into_concrete)
    }

    /// Merge of the override sub-levels alone
    #[must_use]
    pub fn combined_override(&self, path: &AttrPath) -> Option<Value> {
        self.slot_group(Slot::Override)
            .merge_at(path)
            .map(Value::into_concrete)
    }

    /// Raw value at `path` in every configured level, in rank order
    #[must_use]
    pub fn debug_value(&self, path: &AttrPath) -> Vec<(Level, Option<Value>)> {
        self.levels
            .iter()
            .map(|(level, data)| (*level, lookup(data, path).cloned()))
            .collect()
    }

    /// Whether `view` reflects the store's latest state
    #[inline]
    #[must_use]
    pub fn is_current(&self, view: &MergedView) -> bool {
        view.serial() == self.serial
    }

    /// Mutation counter; advances on every change to level data
    #[inline]
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    fn merged_root(&self, key: &str) -> Option<Arc<Value>> {
        if let Some(hit) = self.cache.get(key) {
            trace!(key, "merge cache hit");
            return Some(hit);
        }
        let merged = Arc::new(self.compute(key)?);
        trace!(key, "merge cache miss");
        self.cache.insert(key.to_owned(), Arc::clone(&merged));
        Some(merged)
    }

    /// Fresh forced merge of one top-level key, bypassing the cache
    fn compute(&self, key: &str) -> Option<Value> {
        let groups: Vec<LayerGroup<'_>> =
            Slot::ALL.into_iter().map(|slot| self.slot_group(slot)).collect();
        merge_groups(&groups, &AttrPath::single(key), &HashOnlyMerge).map(Value::into_concrete)
    }

    fn slot_group(&self, slot: Slot) -> LayerGroup<'_> {
        let strategy: &dyn MergeStrategy = if slot.is_composite() {
            self.config.slot_sequences.strategy()
        } else {
            &HashOnlyMerge
        };
        let layers = slot
            .levels()
            .iter()
            .filter_map(|level| self.levels.get(level))
            .collect();
        LayerGroup::new(layers, strategy)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Writable accessor for one level
    ///
    /// # Errors
    /// `UnknownLevel` if the level is not configured
    pub fn level(&mut self, level: Level) -> AttrResult<LevelView<'_>> {
        self.level_data(level)?;
        Ok(LevelView::new(self, level, AttrPath::root()))
    }

    /// Writable accessor for a level given by name
    ///
    /// # Errors
    /// `UnknownLevel` if the name is not a level or not configured
    pub fn level_named(&mut self, name: &str) -> AttrResult<LevelView<'_>> {
        let level = name.parse()?;
        self.level(level)
    }

    /// Write `value` at `path` in `level`, creating missing mappings
    ///
    /// # Errors
    /// `UnknownLevel`, `EmptyPath`, `TypeConflict` or `IndexOutOfBounds`
    /// leave the level untouched; `Listener` means the write was applied
    /// but a listener failed
    pub fn set(&mut self, level: Level, path: &AttrPath, value: impl Into<Value>) -> AttrResult<()> {
        self.write(level, path, value.into(), true)
    }

    /// Write `value` at `path` in `level` without creating containers
    ///
    /// # Errors
    /// As [`AttributeStore::set`], plus `MissingIntermediate`
    pub fn set_strict(
        &mut self,
        level: Level,
        path: &AttrPath,
        value: impl Into<Value>,
    ) -> AttrResult<()> {
        self.write(level, path, value.into(), false)
    }

    /// Write only if `level` holds nothing (or null) at `path`
    ///
    /// Returns whether the write happened.
    ///
    /// # Errors
    /// As [`AttributeStore::set`]
    pub fn set_unless(
        &mut self,
        level: Level,
        path: &AttrPath,
        value: impl Into<Value>,
    ) -> AttrResult<bool> {
        let present = lookup(self.level_data(level)?, path).is_some_and(|v| !v.is_null());
        if present {
            return Ok(false);
        }
        self.set(level, path, value)?;
        Ok(true)
    }

    /// Append to the sequence at `path` in `level`, creating it if absent
    ///
    /// The change event carries the sequence path and the appended item.
    ///
    /// # Errors
    /// As [`AttributeStore::set`]; `TypeConflict` if a non-sequence is stored
    pub fn push(&mut self, level: Level, path: &AttrPath, value: impl Into<Value>) -> AttrResult<()> {
        let value = value.into();
        let data = self.level_data_mut(level)?;
        tree::check_write(data, level, path, true)?;
        match tree::slot_mut(data, level, path, || Value::Sequence(Sequence::new()))? {
            Value::Sequence(items) => items.push(value.clone()),
            other => {
                return Err(AttrError::type_conflict(
                    level,
                    path.clone(),
                    NodeKind::Sequence,
                    other.kind(),
                ))
            }
        }
        self.touch(path);
        debug!(%level, %path, "attribute appended");
        self.notifier
            .notify(&ChangeEvent::new(level, path.clone(), value))
    }

    /// Remove the value at `path` from one level
    ///
    /// Never creates containers and never fails on missing ones. Sends no
    /// change event.
    ///
    /// # Errors
    /// `UnknownLevel` or `EmptyPath`
    pub fn unlink(&mut self, level: Level, path: &AttrPath) -> AttrResult<Option<Value>> {
        if path.is_empty() {
            return Err(AttrError::EmptyPath);
        }
        let removed = tree::unlink(self.level_data_mut(level)?, path);
        if removed.is_some() {
            self.touch(path);
            debug!(%level, %path, "attribute unlinked");
        }
        Ok(removed)
    }

    /// Empty the container at `path` in `level`; the root clears the level
    ///
    /// Sends no change event.
    ///
    /// # Errors
    /// `UnknownLevel`, or `TypeConflict` if a leaf is stored at `path`
    pub fn clear(&mut self, level: Level, path: &AttrPath) -> AttrResult<()> {
        let data = self.level_data_mut(level)?;
        if path.is_empty() {
            data.clear();
        } else {
            match tree::get_mut(data, path) {
                None => return Ok(()),
                Some(Value::Mapping(m)) => m.clear(),
                Some(Value::Sequence(s)) => s.clear(),
                Some(other) => {
                    return Err(AttrError::type_conflict(
                        level,
                        path.clone(),
                        NodeKind::Mapping,
                        other.kind(),
                    ))
                }
            }
        }
        self.touch(path);
        debug!(%level, %path, "attribute cleared");
        Ok(())
    }

    /// Remove `path` from the default, normal and override slots
    ///
    /// Automatic facts are left alone. Returns the merged value at `path`
    /// as it was before the removal.
    ///
    /// # Errors
    /// `EmptyPath`
    pub fn rm(&mut self, path: &AttrPath) -> AttrResult<Option<Value>> {
        let previous = self.read_path(path).map(|view| view.to_owned_value());
        for slot in [Slot::Default, Slot::Normal, Slot::Override] {
            self.unlink_all(path, slot.levels())?;
        }
        Ok(previous)
    }

    /// Remove `path` from every default sub-level; returns their previous merge
    ///
    /// # Errors
    /// `EmptyPath`
    pub fn rm_default(&mut self, path: &AttrPath) -> AttrResult<Option<Value>> {
        let previous = self.combined_default(path);
        self.unlink_all(path, Slot::Default.levels())?;
        Ok(previous)
    }

    /// Remove `path` from the normal level; returns its previous value
    ///
    /// # Errors
    /// `EmptyPath`
    pub fn rm_normal(&mut self, path: &AttrPath) -> AttrResult<Option<Value>> {
        let previous = self
            .levels
            .get(&Level::Normal)
            .and_then(|data| lookup(data, path))
            .cloned()
            .map(Value::into_concrete);
        self.unlink_all(path, Slot::Normal.levels())?;
        Ok(previous)
    }

    /// Remove `path` from every override sub-level; returns their previous merge
    ///
    /// # Errors
    /// `EmptyPath`
    pub fn rm_override(&mut self, path: &AttrPath) -> AttrResult<Option<Value>> {
        let previous = self.combined_override(path);
        self.unlink_all(path, Slot::Override.levels())?;
        Ok(previous)
    }

    fn unlink_all(&mut self, path: &AttrPath, levels: &[Level]) -> AttrResult<()> {
        for level in levels {
            if self.levels.contains_key(level) {
                self.unlink(*level, path)?;
            }
        }
        Ok(())
    }

    /// Make `value` the default at `path`, shadowing every other default
    ///
    /// # Errors
    /// `UnknownLevel` if `force_default` is not configured; otherwise as
    /// [`AttributeStore::set`]
    pub fn force_default(&mut self, path: &AttrPath, value: impl Into<Value>) -> AttrResult<()> {
        self.force(Slot::Default, Level::ForceDefault, path, value.into())
    }

    /// Make `value` the override at `path`, shadowing every other override
    ///
    /// # Errors
    /// `UnknownLevel` if `force_override` is not configured; otherwise as
    /// [`AttributeStore::set`]
    pub fn force_override(&mut self, path: &AttrPath, value: impl Into<Value>) -> AttrResult<()> {
        self.force(Slot::Override, Level::ForceOverride, path, value.into())
    }

    fn force(&mut self, slot: Slot, target: Level, path: &AttrPath, value: Value) -> AttrResult<()> {
        tree::check_write(self.level_data(target)?, target, path, true)?;
        for level in slot.levels().iter().filter(|level| **level != target) {
            if self.levels.contains_key(level) {
                self.unlink(*level, path)?;
            }
        }
        self.write(target, path, value, true)
    }

    /// Swap a level's data wholesale; returns the previous data
    ///
    /// Drops every cache entry. Sends no change event.
    ///
    /// # Errors
    /// `UnknownLevel` if the level is not configured
    pub fn replace_level(&mut self, level: Level, data: Mapping) -> AttrResult<Mapping> {
        let slot = self.level_data_mut(level)?;
        let previous = std::mem::replace(slot, data);
        self.cache.invalidate_all();
        self.serial += 1;
        debug!(%level, keys = previous.len(), "level replaced");
        Ok(previous)
    }

    /// Replace the automatic level with freshly discovered facts
    ///
    /// # Errors
    /// `UnknownLevel` if `automatic` is not configured
    pub fn replace_automatic(&mut self, facts: Mapping) -> AttrResult<Mapping> {
        self.replace_level(Level::Automatic, facts)
    }

    fn write(&mut self, level: Level, path: &AttrPath, value: Value, vivify: bool) -> AttrResult<()> {
        let data = self.level_data_mut(level)?;
        tree::check_write(data, level, path, vivify)?;
        *tree::slot_mut(data, level, path, Value::null)? = value.clone();
        self.touch(path);
        debug!(%level, %path, "attribute written");
        self.notifier
            .notify(&ChangeEvent::new(level, path.clone(), value))
    }

    /// Record a mutation beneath `path`
    fn touch(&mut self, path: &AttrPath) {
        match path.top_level_key() {
            Some(key) => {
                self.cache.invalidate(key);
                trace!(key, "merge cache entry invalidated");
            }
            None => {
                self.cache.invalidate_all();
                trace!("merge cache cleared");
            }
        }
        self.serial += 1;
    }

    // ------------------------------------------------------------------
    // Notification and introspection
    // ------------------------------------------------------------------

    /// Register a change listener
    pub fn subscribe(&mut self, listener: impl ChangeListener + 'static) -> ListenerId {
        self.notifier.subscribe(listener)
    }

    /// Remove a change listener; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// The merge cache
    ///
    /// Callers may inspect or invalidate entries but never fill them:
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    /// use strata_store::AttributeStore;
    /// use strata_value::Value;
    ///
    /// let store = AttributeStore::new();
    /// store.cache().insert("a".to_owned(), Arc::new(Value::from(999)));
    /// ```
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &MergeCache {
        &self.cache
    }

    /// Cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Compare every cached entry against a fresh merge
    ///
    /// Deferred values are forced again for the comparison.
    ///
    /// # Errors
    /// The first stale entry found
    pub fn verify_coherence(&self) -> Result<(), CoherenceViolation> {
        for (key, cached) in self.cache.entries() {
            let recomputed = self.compute(&key);
            if recomputed.as_ref() != Some(&*cached) {
                return Err(CoherenceViolation {
                    key,
                    cached: Value::clone(&cached),
                    recomputed,
                });
            }
        }
        Ok(())
    }
}

fn unknown(level: Level) -> AttrError {
    AttrError::UnknownLevel(level.name().to_owned())
}
