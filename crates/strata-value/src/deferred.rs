//! Deferred leaf values
//!
//! A [`Deferred`] is a zero-argument computation stored in place of a value.
//! Level data keeps the computation itself; every merge that surfaces it
//! forces it exactly once and stores the concrete result in that merge
//! output, never back into the level.

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Lazily computed value
#[derive(Clone)]
pub struct Deferred(Arc<dyn Fn() -> Value + Send + Sync>);

impl Deferred {
    /// Wrap a computation
    #[inline]
    #[must_use]
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(compute))
    }

    /// Evaluate the computation
    ///
    /// The result is fully concrete: deferred values nested inside it are
    /// forced as well.
    #[must_use]
    pub fn force(&self) -> Value {
        (self.0)().into_concrete()
    }

    /// Whether two handles share the same computation
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn force_runs_computation_each_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let deferred = Deferred::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from(7)
        });

        assert_eq!(deferred.force(), Value::from(7));
        assert_eq!(deferred.force(), Value::from(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn force_is_recursive() {
        let inner = Deferred::new(|| Value::from("inner"));
        let outer = Deferred::new(move || Value::Deferred(inner.clone()));
        assert_eq!(outer.force(), Value::from("inner"));
    }

    #[test]
    fn equality_is_identity() {
        let a = Deferred::new(|| Value::from(1));
        let b = Deferred::new(|| Value::from(1));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
