//! Testing utilities for the Strata workspace
//!
//! Shared fixtures, a recording change listener and tracing setup.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::Arc;
use strata_store::{AttributeStore, ChangeEvent, ChangeListener, Level, ListenerError};
use strata_value::{Mapping, Value};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Mapping from a JSON literal; panics if the literal is not an object
pub fn mapping(json: serde_json::Value) -> Mapping {
    match Value::from(json) {
        Value::Mapping(m) => m,
        other => panic!("fixture must be a JSON object, got {other}"),
    }
}

/// Value from a JSON literal
pub fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// Store with the four headline levels populated for a web host
///
/// - default: `nginx.port = 80`, `nginx.workers = 2`, `packages = [curl, git]`
/// - normal: `nginx.user = www`
/// - override: `nginx.port = 8080`
/// - automatic: `platform = linux`, `cpu.cores = 8`
pub fn web_host_store() -> AttributeStore {
    let mut store = AttributeStore::new();
    let levels = [
        (
            Level::Default,
            serde_json::json!({"nginx": {"port": 80, "workers": 2}, "packages": ["curl", "git"]}),
        ),
        (Level::Normal, serde_json::json!({"nginx": {"user": "www"}})),
        (Level::Override, serde_json::json!({"nginx": {"port": 8080}})),
        (
            Level::Automatic,
            serde_json::json!({"platform": "linux", "cpu": {"cores": 8}}),
        ),
    ];
    for (level, data) in levels {
        store.replace_level(level, mapping(data)).unwrap();
    }
    store
}

/// Change listener that records every event it sees
///
/// Clones share the same log, so one clone can be subscribed while the test
/// keeps another to inspect.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ChangeListener for RecordingListener {
    fn on_change(&mut self, event: &ChangeEvent) -> Result<(), ListenerError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
