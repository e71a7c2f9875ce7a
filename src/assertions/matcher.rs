// Allow must_use_candidate for matcher factory functions since returning the matcher
// without using it is the common pattern for expectation setup
#![allow(clippy::must_use_candidate)]

//! Argument matchers for mock expectations.
//!
//! A [`CallExpectation`](crate::mock::CallExpectation) decides whether a call
//! belongs to it by asking a [`Matcher`] about the call's arguments:
//!
//! - [`eq`] - deep equality with an expected argument tuple
//! - [`anything`] - accepts any arguments
//! - [`satisfies`] - accepts arguments passing a predicate
//! - [`not`] - negates another matcher
//!
//! # Example
//!
//! ```rust
//! use testkit_deferred::assertions::matcher::{eq, not, satisfies, Matcher};
//!
//! let m = eq((1, "a"));
//! assert!(m.matches(&(1, "a")));
//!
//! let m = not(satisfies(|x: &i32| *x < 0, "is negative"));
//! assert!(m.matches(&3));
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

/// A matcher for call arguments.
///
/// # Implementing Custom Matchers
///
/// ```rust
/// use testkit_deferred::assertions::matcher::Matcher;
///
/// struct IsEven;
///
/// impl Matcher<(i32,)> for IsEven {
///     fn matches(&self, value: &(i32,)) -> bool {
///         value.0 % 2 == 0
///     }
///
///     fn describe(&self) -> String {
///         "first argument is even".to_string()
///     }
///
///     fn describe_mismatch(&self, value: &(i32,)) -> String {
///         format!("{} is not even", value.0)
///     }
/// }
///
/// assert!(IsEven.matches(&(4,)));
/// assert!(!IsEven.matches(&(3,)));
/// ```
pub trait Matcher<T: ?Sized>: Send + Sync {
    /// Check if the value matches.
    fn matches(&self, value: &T) -> bool;

    /// Describe what this matcher expects.
    fn describe(&self) -> String;

    /// Describe why a value didn't match.
    fn describe_mismatch(&self, value: &T) -> String;
}

/// Create an equality matcher.
pub fn eq<T: PartialEq + Debug + Send + Sync>(expected: T) -> EqMatcher<T> {
    EqMatcher { expected }
}

/// Matcher for equality.
pub struct EqMatcher<T> {
    expected: T,
}

impl<T: PartialEq + Debug + Send + Sync> Matcher<T> for EqMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        value == &self.expected
    }

    fn describe(&self) -> String {
        format!("equals {:?}", self.expected)
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not equal {:?}", value, self.expected)
    }
}

/// Create a matcher that accepts any value.
pub fn anything<T: ?Sized>() -> AnythingMatcher<T> {
    AnythingMatcher {
        _phantom: PhantomData,
    }
}

/// Matcher that matches anything.
pub struct AnythingMatcher<T: ?Sized> {
    _phantom: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Matcher<T> for AnythingMatcher<T> {
    fn matches(&self, _value: &T) -> bool {
        true
    }

    fn describe(&self) -> String {
        "anything".to_string()
    }

    fn describe_mismatch(&self, _value: &T) -> String {
        "matches anything".to_string()
    }
}

/// Create a predicate-based matcher.
///
/// ```rust
/// use testkit_deferred::assertions::matcher::{Matcher, satisfies};
///
/// let m = satisfies(|args: &(i32, i32)| args.0 < args.1, "ascending pair");
/// assert!(m.matches(&(1, 2)));
/// assert!(!m.matches(&(2, 1)));
/// ```
pub fn satisfies<T, F>(predicate: F, description: &str) -> PredicateMatcher<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateMatcher {
        predicate,
        description: description.to_string(),
        _phantom: PhantomData,
    }
}

/// Matcher based on a predicate function.
pub struct PredicateMatcher<T, F> {
    predicate: F,
    description: String,
    _phantom: PhantomData<fn(&T)>,
}

impl<T: Debug, F: Fn(&T) -> bool + Send + Sync> Matcher<T> for PredicateMatcher<T, F> {
    fn matches(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} does not satisfy: {}", value, self.description)
    }
}

/// Create a matcher that negates another matcher.
pub fn not<T, M: Matcher<T> + 'static>(matcher: M) -> NotMatcher<T> {
    NotMatcher {
        inner: Box::new(matcher),
    }
}

/// Matcher that negates another matcher.
pub struct NotMatcher<T: ?Sized> {
    inner: Box<dyn Matcher<T>>,
}

impl<T: Debug> Matcher<T> for NotMatcher<T> {
    fn matches(&self, value: &T) -> bool {
        !self.inner.matches(value)
    }

    fn describe(&self) -> String {
        format!("not {}", self.inner.describe())
    }

    fn describe_mismatch(&self, value: &T) -> String {
        format!("{:?} unexpectedly matched: {}", value, self.inner.describe())
    }
}

impl<T: ?Sized> Matcher<T> for Box<dyn Matcher<T>> {
    fn matches(&self, value: &T) -> bool {
        (**self).matches(value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn describe_mismatch(&self, value: &T) -> String {
        (**self).describe_mismatch(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_matcher_on_tuples() {
        let m = eq((1, "a".to_string()));
        assert!(m.matches(&(1, "a".to_string())));
        assert!(!m.matches(&(1, "b".to_string())));
        assert!(!m.matches(&(2, "a".to_string())));
    }

    #[test]
    fn test_eq_matcher_is_deep() {
        let m = eq(vec![vec![1, 2], vec![3]]);
        assert!(m.matches(&vec![vec![1, 2], vec![3]]));
        assert!(!m.matches(&vec![vec![1, 2], vec![]]));
    }

    #[test]
    fn test_eq_matcher_describe() {
        let m = eq(42);
        assert_eq!(m.describe(), "equals 42");
        assert_eq!(m.describe_mismatch(&0), "0 does not equal 42");
    }

    #[test]
    fn test_anything_matcher() {
        let m = anything::<(i32, bool)>();
        assert!(m.matches(&(0, false)));
        assert!(m.matches(&(-5, true)));
        assert_eq!(m.describe(), "anything");
    }

    #[test]
    fn test_satisfies_matcher() {
        let m = satisfies(|x: &i32| *x % 2 == 0, "is even");
        assert!(m.matches(&4));
        assert!(!m.matches(&3));
        assert_eq!(m.describe_mismatch(&3), "3 does not satisfy: is even");
    }

    #[test]
    fn test_not_matcher() {
        let m = not(eq(0));
        assert!(m.matches(&1));
        assert!(!m.matches(&0));
        assert_eq!(m.describe(), "not equals 0");
    }

    #[test]
    fn test_boxed_matcher() {
        let m: Box<dyn Matcher<i32>> = Box::new(eq(7));
        assert!(m.matches(&7));
        assert_eq!(m.describe(), "equals 7");
    }
}
