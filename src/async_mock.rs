//! Callback mocks and deferred assertions on top of a [`MockControl`].
//!
//! [`AsyncMockControl`] borrows a controller and produces plain functions that
//! are registered with it as mocks expected to be called exactly once. Nothing
//! here checks whether those functions ran: a callback that never fires is
//! reported by the controller's [`verify_all`](MockControl::verify_all).
//! Value mismatches panic inside the callback, when it runs.
//!
//! # Example
//!
//! ```rust
//! use testkit_deferred::async_mock::AsyncMockControl;
//! use testkit_deferred::deferred::Deferred;
//! use testkit_deferred::mock::MockControl;
//!
//! let control = MockControl::new();
//! let async_mock = AsyncMockControl::new(&control);
//!
//! let loaded = Deferred::<String, String>::new();
//! async_mock
//!     .assert_deferred_equals("page body", Deferred::succeeded("<p>".to_string()), &loaded)
//!     .unwrap();
//!
//! loaded.resolve("<p>".to_string()).unwrap();
//! control.verify_all().unwrap();
//! ```

use std::fmt::Debug;

use tracing::debug;

use crate::assertions::assert_equals;
use crate::deferred::{Deferred, DeferredHandle};
use crate::error::{Error, Result};
use crate::mock::{CallExpectation, MockControl, Times};

const ASYNC_ASSERT_EQUALS: &str = "async_assert_equals";
const ASSERT_DEFERRED_ERROR: &str = "assert_deferred_error";
const ASSERT_DEFERRED_EQUALS: &str = "assert_deferred_equals";

/// Either a plain value or a deferred handle `D` producing one.
///
/// `D` is usually a [`Deferred`], but any [`DeferredHandle`] works.
#[derive(Debug, Clone)]
pub enum DeferredOr<T, D> {
    /// A value known now.
    Value(T),
    /// A value known once the deferred succeeds.
    Deferred(D),
}

impl<T, D> DeferredOr<T, D> {
    /// Wrap a plain value.
    pub fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// Returns `true` for the [`DeferredOr::Deferred`] variant.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl<T, E> From<Deferred<T, E>> for DeferredOr<T, Deferred<T, E>> {
    fn from(deferred: Deferred<T, E>) -> Self {
        Self::Deferred(deferred)
    }
}

impl<T, E> From<&Deferred<T, E>> for DeferredOr<T, Deferred<T, E>> {
    fn from(deferred: &Deferred<T, E>) -> Self {
        Self::Deferred(deferred.clone())
    }
}

/// Assertion helpers for callback- and deferred-based code.
///
/// Holds a borrowed [`MockControl`]; every helper registers its mocks there.
#[derive(Debug, Clone, Copy)]
pub struct AsyncMockControl<'a> {
    control: &'a MockControl,
}

impl<'a> AsyncMockControl<'a> {
    /// Wrap a controller.
    #[must_use]
    pub fn new(control: &'a MockControl) -> Self {
        Self { control }
    }

    /// The wrapped controller.
    #[must_use]
    pub fn control(&self) -> &'a MockControl {
        self.control
    }

    /// Create a function that must be called exactly once.
    ///
    /// Arguments are forwarded unchanged to `callback` and its result is
    /// returned. If the function is never called, `verify_all` fails; a
    /// second call panics.
    ///
    /// ```rust
    /// use testkit_deferred::async_mock::AsyncMockControl;
    /// use testkit_deferred::mock::MockControl;
    ///
    /// let control = MockControl::new();
    /// let on_sum = AsyncMockControl::new(&control)
    ///     .create_callback_mock("on_sum", |(a, b): (i32, i32)| a + b);
    ///
    /// assert_eq!(on_sum((2, 3)), 5);
    /// control.verify_all().unwrap();
    /// ```
    pub fn create_callback_mock<A, R, F>(
        &self,
        name: &str,
        callback: F,
    ) -> impl Fn(A) -> R + Clone + Send + Sync + 'static
    where
        A: Debug + Clone + Send + 'static,
        R: 'static,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let mock = self.control.create_function_mock::<A, R>(name);
        mock.expect(
            CallExpectation::any_args()
                .times(Times::once())
                .returning(callback),
        );
        mock.replay();
        debug!(mock = name, "registered callback mock");

        move |args| mock.call(args)
    }

    /// Like [`create_callback_mock`](Self::create_callback_mock), with
    /// `receiver` handed to `callback` as its context on every call.
    pub fn create_bound_callback_mock<S, A, R, F>(
        &self,
        name: &str,
        receiver: S,
        callback: F,
    ) -> impl Fn(A) -> R + Clone + Send + Sync + 'static
    where
        S: Send + Sync + 'static,
        A: Debug + Clone + Send + 'static,
        R: 'static,
        F: Fn(&S, A) -> R + Send + Sync + 'static,
    {
        self.create_callback_mock(name, move |args| callback(&receiver, args))
    }

    /// Create a callback that must be called exactly once with arguments
    /// equal to `expected`.
    ///
    /// The returned function panics with `message` when called with other
    /// arguments.
    pub fn async_assert_equals<A>(
        &self,
        message: impl Into<String>,
        expected: A,
    ) -> impl Fn(A) + Clone + Send + Sync + 'static
    where
        A: PartialEq + Debug + Clone + Send + Sync + 'static,
    {
        let message = message.into();
        self.create_callback_mock(ASYNC_ASSERT_EQUALS, move |actual: A| {
            assert_equals(&message, &expected, &actual);
        })
    }

    /// Assert that running `trigger` makes `deferred` fail.
    ///
    /// A failure continuation that must fire exactly once is attached before
    /// `trigger` runs. If the deferred succeeds or never fires,
    /// `verify_all` fails.
    pub fn assert_deferred_error<D, T, E, F>(&self, deferred: &D, trigger: F)
    where
        D: DeferredHandle<T, E>,
        E: Debug + Clone + Send + 'static,
        F: FnOnce(),
    {
        let errback = self.create_callback_mock(ASSERT_DEFERRED_ERROR, |_err: E| {});
        deferred.add_errback(errback);
        trigger();
    }

    /// Assert that `expected` and `actual` resolve to equal values.
    ///
    /// At least one side must be a deferred. Both sides share the handle
    /// type `D`, so a literal side takes it from the deferred one. When
    /// `expected` is deferred,
    /// its value is compared with `actual` once it succeeds, waiting on
    /// `actual` too if it is deferred. When only `actual` is deferred, its
    /// value is compared with the literal `expected`. Each wait is a callback
    /// mock, so a deferred that fails or never fires is caught by
    /// `verify_all`; unequal values panic with `message`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if neither side is a deferred.
    pub fn assert_deferred_equals<T, E, D>(
        &self,
        message: impl Into<String>,
        expected: impl Into<DeferredOr<T, D>>,
        actual: impl Into<DeferredOr<T, D>>,
    ) -> Result<()>
    where
        T: PartialEq + Debug + Clone + Send + Sync + 'static,
        D: DeferredHandle<T, E> + Send + Sync + 'static,
    {
        let message = message.into();
        match (expected.into(), actual.into()) {
            (DeferredOr::Value(_), DeferredOr::Value(_)) => Err(Error::usage(
                "assert_deferred_equals needs a deferred for expected or actual",
            )),
            (DeferredOr::Deferred(expected), actual) => {
                let control = self.control.clone();
                let on_expected =
                    self.create_callback_mock(ASSERT_DEFERRED_EQUALS, move |expected_value: T| {
                        match &actual {
                            DeferredOr::Value(actual_value) => {
                                assert_equals(&message, &expected_value, actual_value);
                            }
                            DeferredOr::Deferred(actual) => AsyncMockControl::new(&control)
                                .compare_when_resolved::<T, E, D>(
                                    message.clone(),
                                    expected_value,
                                    actual,
                                ),
                        }
                    });
                expected.add_callback(on_expected);
                Ok(())
            }
            (DeferredOr::Value(expected_value), DeferredOr::Deferred(actual)) => {
                self.compare_when_resolved::<T, E, D>(message, expected_value, &actual);
                Ok(())
            }
        }
    }

    fn compare_when_resolved<T, E, D>(&self, message: String, expected: T, actual: &D)
    where
        T: PartialEq + Debug + Clone + Send + Sync + 'static,
        D: DeferredHandle<T, E>,
    {
        let on_actual =
            self.create_callback_mock(ASSERT_DEFERRED_EQUALS, move |actual_value: T| {
                assert_equals(&message, &expected, &actual_value);
            });
        actual.add_callback(on_actual);
    }
}
