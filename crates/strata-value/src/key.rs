//! Key canonicalization
//!
//! Attribute keys may be written as plain strings or as [`Symbol`]s. Both
//! fold to the same canonical `String` before any storage or lookup, so
//! `map.get("port")` and `map.get(Symbol::new("port"))` always agree.

use std::fmt::{self, Display, Formatter};

/// Symbol-like key
///
/// An identifier-style key that is distinct from a string at the call site
/// but indistinguishable once stored. Symbols never survive canonicalization;
/// iteration always yields the folded string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(&'static str);

impl Symbol {
    /// Create a symbol from an identifier
    #[inline]
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// Fold a key representation into its canonical string form
pub trait Canonicalize {
    /// Canonical key text
    fn canonicalize(self) -> String;
}

impl Canonicalize for &str {
    #[inline]
    fn canonicalize(self) -> String {
        self.to_owned()
    }
}

impl Canonicalize for String {
    #[inline]
    fn canonicalize(self) -> String {
        self
    }
}

impl Canonicalize for &String {
    #[inline]
    fn canonicalize(self) -> String {
        self.clone()
    }
}

impl Canonicalize for Symbol {
    #[inline]
    fn canonicalize(self) -> String {
        self.0.to_owned()
    }
}

impl Canonicalize for &Symbol {
    #[inline]
    fn canonicalize(self) -> String {
        self.0.to_owned()
    }
}

impl Canonicalize for char {
    #[inline]
    fn canonicalize(self) -> String {
        self.to_string()
    }
}
