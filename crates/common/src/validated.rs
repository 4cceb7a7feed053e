//! An accumulating success-or-errors container.
//!
//! `Validated<T, E>` holds either a success value or a non-empty set of
//! errors, never both. Unlike `std::result::Result` chained with `?`, its
//! [`with`](Validated::with) combinator runs independent checks side by side
//! and reports *every* failure, not just the first: when two inputs are both
//! invalid their error sets are unioned into one.
//!
//! Dependent steps (where a later check is meaningless if an earlier one
//! failed) still short-circuit through [`and_then`](Validated::and_then).
//!
//! The error type only needs to know how to merge with itself, expressed by
//! the [`Combine`] trait. [`ErrorSet`](crate::ErrorSet) is the usual choice.

use crate::ErrorSet;

/// Associative, commutative merge of two error values.
///
/// For collection-like error types this is a set union; duplicates collapse.
pub trait Combine {
    /// Merge `other` into `self`, producing the combined error value.
    #[must_use]
    fn combine(self, other: Self) -> Self;
}

/// Either a valid value or an accumulated set of errors.
///
/// Construct with [`Validated::ok`] / [`Validated::fail`], combine
/// independent values with [`with`](Validated::with) or [`reduce`], and
/// observe the outcome with [`into_result`](Validated::into_result) or
/// pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated<T, E = ErrorSet> {
    /// The computation succeeded.
    Valid(T),
    /// One or more checks failed; all failures are carried together.
    Invalid(E),
}

impl<T> Validated<T, ErrorSet> {
    /// Shorthand for failing with a single message.
    pub fn fail(message: impl Into<String>) -> Self {
        Validated::Invalid(ErrorSet::of(message))
    }
}

impl<T, E> Validated<T, E> {
    /// Wrap a success value.
    pub fn ok(value: T) -> Self {
        Validated::Valid(value)
    }

    /// True if this holds a value.
    pub fn has_value(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }

    /// The success value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Validated::Valid(value) => Some(value),
            Validated::Invalid(_) => None,
        }
    }

    /// The accumulated errors, if any.
    pub fn errors(self) -> Option<E> {
        match self {
            Validated::Valid(_) => None,
            Validated::Invalid(errors) => Some(errors),
        }
    }

    /// Transform the success value, passing errors through untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U, E> {
        match self {
            Validated::Valid(value) => Validated::Valid(f(value)),
            Validated::Invalid(errors) => Validated::Invalid(errors),
        }
    }

    /// Transform the error value, passing successes through untouched.
    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> Validated<T, F> {
        match self {
            Validated::Valid(value) => Validated::Valid(value),
            Validated::Invalid(errors) => Validated::Invalid(f(errors)),
        }
    }

    /// Short-circuiting bind for *dependent* steps.
    ///
    /// There is no point validating the claims of a token that failed to
    /// parse, so unlike [`with`](Validated::with) this does not accumulate:
    /// an existing error is returned unchanged.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Validated<U, E>) -> Validated<U, E> {
        match self {
            Validated::Valid(value) => f(value),
            Validated::Invalid(errors) => Validated::Invalid(errors),
        }
    }

    /// Fold both cases into a single value.
    pub fn merge(self, from_errors: impl FnOnce(E) -> T) -> T {
        match self {
            Validated::Valid(value) => value,
            Validated::Invalid(errors) => from_errors(errors),
        }
    }

    /// Convert into a plain `Result` for interop with `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the accumulated error value when invalid.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Validated::Valid(value) => Ok(value),
            Validated::Invalid(errors) => Err(errors),
        }
    }
}

impl<T, E: Combine> Validated<T, E> {
    /// Combine two independent validations, accumulating failures.
    ///
    /// Works as a logical AND over the success states:
    ///
    /// - both valid: the output is `f(a, b)`;
    /// - one invalid: that error is propagated unchanged;
    /// - both invalid: the two error values are *unioned* into one, so
    ///   every failure is reported together.
    pub fn with<U, V>(
        self,
        other: Validated<U, E>,
        f: impl FnOnce(T, U) -> V,
    ) -> Validated<V, E> {
        match (self, other) {
            (Validated::Valid(a), Validated::Valid(b)) => Validated::Valid(f(a, b)),
            (Validated::Valid(_), Validated::Invalid(errors))
            | (Validated::Invalid(errors), Validated::Valid(_)) => Validated::Invalid(errors),
            (Validated::Invalid(a), Validated::Invalid(b)) => Validated::Invalid(a.combine(b)),
        }
    }

    /// Pair two independent validations, accumulating failures.
    pub fn zip<U>(self, other: Validated<U, E>) -> Validated<(T, U), E> {
        self.with(other, |a, b| (a, b))
    }

    /// Downgrade a valid value to invalid if `predicate` reports an error.
    ///
    /// An existing error passes through untouched (the predicate is not
    /// evaluated against a value that does not exist).
    pub fn check(self, predicate: impl FnOnce(&T) -> Option<E>) -> Validated<T, E> {
        match self {
            Validated::Valid(value) => match predicate(&value) {
                None => Validated::Valid(value),
                Some(errors) => Validated::Invalid(errors),
            },
            invalid => invalid,
        }
    }
}

/// Fold a sequence of independent validations into one.
///
/// Succeeds with all the values only if every element succeeded; otherwise
/// the failures of *every* failing element are unioned together.
pub fn reduce<T, E: Combine>(
    items: impl IntoIterator<Item = Validated<T, E>>,
) -> Validated<Vec<T>, E> {
    items
        .into_iter()
        .fold(Validated::ok(Vec::new()), |acc, item| {
            acc.with(item, |mut values, value| {
                values.push(value);
                values
            })
        })
}
