//! A deduplicating, unioning set of error messages.
//!
//! `ErrorSet` is the error type used with [`Validated`](crate::Validated)
//! throughout the entitlement pipeline. Union is associative, commutative
//! and idempotent, so accumulating the same diagnostic from two independent
//! checks reports it once, and the order checks ran in does not change the
//! outcome.

use crate::validated::Combine;
use std::collections::BTreeSet;
use std::fmt;

/// An immutable, non-empty set of human-readable error messages.
///
/// Backed by a `BTreeSet` so iteration (and therefore CLI output and test
/// assertions) is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSet {
    errors: BTreeSet<String>,
}

impl ErrorSet {
    /// Create a set holding a single message.
    ///
    /// An empty message is a programming error.
    pub fn of(message: impl Into<String>) -> Self {
        let message = message.into();
        assert!(!message.is_empty(), "error message must not be empty");
        let mut errors = BTreeSet::new();
        errors.insert(message);
        ErrorSet { errors }
    }

    /// Create a set from a sequence of messages.
    ///
    /// At least one message is required; duplicates collapse.
    pub fn from_messages(messages: impl IntoIterator<Item = String>) -> Self {
        let errors: BTreeSet<String> = messages.into_iter().collect();
        assert!(!errors.is_empty(), "at least one error must be specified");
        ErrorSet { errors }
    }

    /// Union this set with another, collapsing duplicates.
    #[must_use]
    pub fn union(mut self, other: ErrorSet) -> Self {
        self.errors.extend(other.errors);
        self
    }

    /// Number of distinct messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; an `ErrorSet` holds at least one message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate the messages in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    /// True if any message contains the given fragment.
    ///
    /// Convenient for asserting on a diagnostic without binding a test to
    /// the full message text.
    #[must_use]
    pub fn any_contains(&self, fragment: &str) -> bool {
        self.errors.iter().any(|e| e.contains(fragment))
    }
}

impl Combine for ErrorSet {
    fn combine(self, other: Self) -> Self {
        self.union(other)
    }
}

impl fmt::Display for ErrorSet {
    /// One message per line: the CLI and server surface every accumulated
    /// issue, never just the first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSet {}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_collapses_duplicates() {
        let a = ErrorSet::of("shared").union(ErrorSet::of("only-a"));
        let b = ErrorSet::of("shared").union(ErrorSet::of("only-b"));
        let combined = a.union(b);
        assert_eq!(combined.len(), 3);
        assert!(combined.any_contains("shared"));
    }

    #[test]
    fn union_is_commutative() {
        let ab = ErrorSet::of("a").union(ErrorSet::of("b"));
        let ba = ErrorSet::of("b").union(ErrorSet::of("a"));
        assert_eq!(ab, ba);
    }

    #[test]
    fn union_is_idempotent() {
        let once = ErrorSet::of("same");
        let twice = ErrorSet::of("same").union(ErrorSet::of("same"));
        assert_eq!(once, twice);
    }

    #[test]
    fn display_is_one_message_per_line() {
        let set = ErrorSet::of("second").union(ErrorSet::of("first"));
        let rendered = set.to_string();
        assert_eq!(rendered, "first\nsecond");
    }

    #[test]
    #[should_panic(expected = "at least one error")]
    fn from_messages_requires_at_least_one() {
        let _ = ErrorSet::from_messages(Vec::new());
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn of_rejects_empty_message() {
        let _ = ErrorSet::of("");
    }
}
