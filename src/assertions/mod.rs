//! Equality assertions and argument matchers.
//!
//! - [`assert_equals`] - Deep-equality assertion carrying a message
//! - [`assert_equals!`](crate::assert_equals) - Macro form with format arguments
//! - [`matcher`] - Argument matchers used by mock expectations
//!
//! # Example
//!
//! ```rust
//! use testkit_deferred::assertions::assert_equals;
//!
//! assert_equals("lengths match", &3, &"abc".len());
//! ```
//!
//! ```rust,should_panic
//! use testkit_deferred::assert_equals;
//!
//! assert_equals!(vec![1, 2], vec![1, 3], "item {} differs", 1);
//! ```

use std::fmt::Debug;

use crate::error::Error;

pub mod matcher;

/// Assert that two values are deeply equal.
///
/// # Panics
///
/// Panics with `message` and both values if they differ.
#[track_caller]
pub fn assert_equals<T: PartialEq + Debug + ?Sized>(message: &str, expected: &T, actual: &T) {
    if expected != actual {
        panic!(
            "{}",
            Error::AssertionFailed(format!(
                "{message}\n  expected: {expected:?}\n  actual: {actual:?}"
            ))
        );
    }
}

/// Assert that two values are deeply equal, with an optional formatted message.
///
/// # Panics
///
/// Panics if the values differ.
#[macro_export]
macro_rules! assert_equals {
    ($expected:expr, $actual:expr) => {
        $crate::assertions::assert_equals("values differ", &$expected, &$actual)
    };
    ($expected:expr, $actual:expr, $($arg:tt)+) => {
        $crate::assertions::assert_equals(&format!($($arg)+), &$expected, &$actual)
    };
}
