// Allow must_use_candidate since mock methods often have useful side effects
#![allow(clippy::must_use_candidate)]

//! Named function mocks.
//!
//! A [`FunctionMock`] starts in the record phase, where expectations are
//! added with [`FunctionMock::expect`]. After [`FunctionMock::replay`] it
//! accepts calls, matching each one against the recorded expectations in
//! order and running the matched expectation's behavior.
//!
//! # Example
//!
//! ```rust
//! use testkit_deferred::mock::{CallExpectation, MockControl};
//!
//! let control = MockControl::new();
//! let double = control.create_function_mock::<(i32,), i32>("double");
//!
//! double.expect(CallExpectation::with_args((4,)).returning(|(x,)| x * 2));
//! double.replay();
//!
//! assert_eq!(double.call((4,)), 8);
//! assert!(control.verify_all().is_ok());
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::expectation::{Behavior, CallExpectation};
use super::Verifiable;
use crate::error::{Error, Result};

/// A record of a single call made to a mock.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord<A> {
    /// The arguments passed to the call.
    pub args: A,
    /// When the call was made (relative to mock creation).
    pub timestamp: Duration,
}

struct MockState<A, R> {
    replaying: bool,
    expectations: Vec<CallExpectation<A, R>>,
    calls: Vec<CallRecord<A>>,
    failures: Vec<Error>,
}

impl<A: Debug, R> MockState<A, R> {
    fn new() -> Self {
        Self {
            replaying: false,
            expectations: Vec::new(),
            calls: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Finds the expectation a call belongs to and returns its behavior.
    fn match_call(&mut self, args: &A) -> std::result::Result<Behavior<A, R>, String> {
        if !self.replaying {
            return Err(format!("called with {args:?} before replay"));
        }

        let mut saw_saturated = false;
        for expectation in &mut self.expectations {
            if !expectation.accepts(args) {
                continue;
            }
            if expectation.is_saturated() {
                saw_saturated = true;
                continue;
            }
            return expectation
                .record_call()
                .ok_or_else(|| format!("called with {args:?} but no call behavior is configured"));
        }

        if saw_saturated {
            Err(format!("called with {args:?} more often than expected"))
        } else if self.expectations.is_empty() {
            Err(format!("called with {args:?} but no calls were expected"))
        } else {
            let expected = self
                .expectations
                .iter()
                .map(|e| format!("{} [{}]", e.describe(), e.describe_mismatch(args)))
                .collect::<Vec<_>>()
                .join(", ");
            Err(format!("called with {args:?}, expected one of: {expected}"))
        }
    }
}

pub(crate) struct MockInner<A, R> {
    name: String,
    state: Mutex<MockState<A, R>>,
    created_at: Instant,
}

impl<A, R> Verifiable for MockInner<A, R>
where
    A: Debug + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn replay(&self) {
        self.state.lock().replaying = true;
    }

    fn verify(&self) -> Result<()> {
        let state = self.state.lock();
        let mut errors = state.failures.clone();
        errors.extend(
            state
                .expectations
                .iter()
                .filter(|expectation| !expectation.is_satisfied())
                .map(|expectation| Error::UnmetExpectation {
                    mock: self.name.clone(),
                    expected: expectation.expected_times(),
                    actual: expectation.call_count(),
                }),
        );

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Verification(errors)),
        }
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.replaying = false;
        state.expectations.clear();
        state.calls.clear();
        state.failures.clear();
    }
}

/// A named mock standing in for a function taking `A` and returning `R`.
///
/// Several arguments are passed as a tuple. Cloning yields another handle to
/// the same mock.
pub struct FunctionMock<A, R> {
    inner: Arc<MockInner<A, R>>,
}

impl<A, R> FunctionMock<A, R>
where
    A: Debug + Clone + Send + 'static,
    R: 'static,
{
    pub(crate) fn new(name: String) -> Self {
        Self {
            inner: Arc::new(MockInner {
                name,
                state: Mutex::new(MockState::new()),
                created_at: Instant::now(),
            }),
        }
    }

    pub(crate) fn as_verifiable(&self) -> Arc<dyn Verifiable> {
        Arc::clone(&self.inner) as Arc<dyn Verifiable>
    }

    /// The name this mock was registered under.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Record an expectation. Expectations are matched in the order they
    /// were added.
    pub fn expect(&self, expectation: CallExpectation<A, R>) -> &Self {
        trace!(mock = %self.inner.name, ?expectation, "recording expectation");
        self.inner.state.lock().expectations.push(expectation);
        self
    }

    /// Mark the mock ready to receive calls.
    pub fn replay(&self) {
        Verifiable::replay(&*self.inner);
    }

    /// Returns `true` once the mock has been replayed.
    pub fn is_replaying(&self) -> bool {
        self.inner.state.lock().replaying
    }

    /// Call the mock.
    ///
    /// The behavior of the matched expectation runs after the mock's
    /// internal lock is released, so it may call back into this mock or
    /// register new mocks.
    ///
    /// # Panics
    ///
    /// Panics if the call matches no expectation that still accepts calls,
    /// or if the mock has not been replayed. The failure is also kept so
    /// that [`MockControl::verify_all`](super::MockControl::verify_all)
    /// reports it.
    #[track_caller]
    pub fn call(&self, args: A) -> R {
        let behavior = {
            let mut state = self.inner.state.lock();
            state.calls.push(CallRecord {
                args: args.clone(),
                timestamp: self.inner.created_at.elapsed(),
            });

            let matched = state.match_call(&args);
            match matched {
                Ok(behavior) => behavior,
                Err(detail) => {
                    let err = Error::unexpected_call(self.inner.name.clone(), detail);
                    state.failures.push(err.clone());
                    drop(state);
                    warn!(mock = %self.inner.name, error = %err, "unexpected call");
                    panic!("{err}");
                }
            }
        };

        trace!(mock = %self.inner.name, ?args, "call matched");
        behavior(args)
    }

    /// Get all recorded calls, expected or not.
    pub fn calls(&self) -> Vec<CallRecord<A>> {
        self.inner.state.lock().calls.clone()
    }

    /// Get the number of times the mock was called.
    pub fn call_count(&self) -> usize {
        self.inner.state.lock().calls.len()
    }

    /// Check if the mock was called at least once.
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Check if the mock was called with specific arguments.
    pub fn was_called_with(&self, expected: &A) -> bool
    where
        A: PartialEq,
    {
        self.inner
            .state
            .lock()
            .calls
            .iter()
            .any(|c| &c.args == expected)
    }

    /// Get the most recent call record.
    pub fn last_call(&self) -> Option<CallRecord<A>> {
        self.inner.state.lock().calls.last().cloned()
    }

    /// Check this mock's expectations alone.
    ///
    /// # Errors
    ///
    /// Returns the unmet expectations and unexpected calls of this mock.
    pub fn verify(&self) -> Result<()> {
        Verifiable::verify(&*self.inner)
    }
}

impl<A, R> Clone for FunctionMock<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Debug, R> Debug for FunctionMock<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("FunctionMock")
            .field("name", &self.inner.name)
            .field("replaying", &state.replaying)
            .field("expectations", &state.expectations)
            .field("calls", &state.calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Times;

    fn mock<A, R>(name: &str) -> FunctionMock<A, R>
    where
        A: Debug + Clone + Send + 'static,
        R: 'static,
    {
        FunctionMock::new(name.to_string())
    }

    #[test]
    fn test_call_runs_behavior() {
        let m = mock::<(i32, i32), i32>("add");
        m.expect(CallExpectation::any_args().returning(|(a, b)| a + b));
        m.replay();

        assert_eq!(m.call((2, 3)), 5);
        assert!(m.was_called());
        assert!(m.was_called_with(&(2, 3)));
        assert!(m.verify().is_ok());
    }

    #[test]
    fn test_expectations_matched_in_order() {
        let m = mock::<(i32,), &'static str>("lookup");
        m.expect(CallExpectation::with_args((1,)).returning(|_| "one"));
        m.expect(
            CallExpectation::any_args()
                .times(Times::Any)
                .returning(|_| "other"),
        );
        m.replay();

        assert_eq!(m.call((1,)), "one");
        assert_eq!(m.call((1,)), "other");
        assert_eq!(m.call((7,)), "other");
        assert!(m.verify().is_ok());
    }

    #[test]
    fn test_uncalled_mock_fails_verify() {
        let m = mock::<(), ()>("never");
        m.expect(CallExpectation::any_args().returning_default());
        m.replay();

        let err = m.verify().unwrap_err();
        assert_eq!(
            err,
            Error::UnmetExpectation {
                mock: "never".to_string(),
                expected: Times::once(),
                actual: 0,
            }
        );
    }

    #[test]
    #[should_panic(expected = "Unexpected call to twice: called with () more often than expected")]
    fn test_second_call_panics() {
        let m = mock::<(), ()>("twice");
        m.expect(CallExpectation::any_args().returning_default());
        m.replay();

        m.call(());
        m.call(());
    }

    #[test]
    fn test_unexpected_call_is_reported_by_verify() {
        let m = mock::<(i32,), ()>("strict");
        m.expect(CallExpectation::with_args((1,)).returning_default());
        m.replay();

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.call((2,))));
        assert!(caught.is_err());

        let err = m.verify().unwrap_err();
        let failures = err.failures();
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0], Error::UnexpectedCall { .. }));
        assert!(failures[0]
            .to_string()
            .contains("called with (2,), expected one of: equals (1,) (exactly 1 time(s))"));
        assert!(failures[0].to_string().contains("[(2,) does not equal (1,)]"));
        assert!(matches!(failures[1], Error::UnmetExpectation { actual: 0, .. }));
    }

    #[test]
    #[should_panic(expected = "before replay")]
    fn test_call_before_replay_panics() {
        let m = mock::<(), ()>("early");
        m.expect(CallExpectation::any_args().returning_default());
        m.call(());
    }

    #[test]
    #[should_panic(expected = "no call behavior is configured")]
    fn test_call_without_behavior_panics() {
        let m = mock::<(), u8>("bare");
        m.expect(CallExpectation::any_args());
        m.replay();
        m.call(());
    }

    #[test]
    fn test_behavior_may_reenter_mock() {
        let m = mock::<(u32,), u32>("countdown");
        let handle = m.clone();
        m.expect(
            CallExpectation::any_args()
                .times(Times::Any)
                .returning(move |(n,)| if n == 0 { 0 } else { 1 + handle.call((n - 1,)) }),
        );
        m.replay();

        assert_eq!(m.call((3,)), 3);
        assert_eq!(m.call_count(), 4);
    }

    #[test]
    fn test_reset_returns_to_record_phase() {
        let m = mock::<(), ()>("resettable");
        m.expect(CallExpectation::any_args().returning_default());
        m.replay();
        m.call(());

        Verifiable::reset(&*m.inner);

        assert!(!m.is_replaying());
        assert_eq!(m.call_count(), 0);
        assert!(m.verify().is_ok());
    }

    #[test]
    fn test_last_call_and_debug() {
        let m = mock::<(String,), ()>("log");
        m.expect(
            CallExpectation::any_args()
                .times(Times::AtLeast(1))
                .returning_default(),
        );
        m.replay();

        assert!(m.last_call().is_none());
        m.call(("first".to_string(),));
        m.call(("second".to_string(),));
        assert_eq!(m.last_call().unwrap().args, ("second".to_string(),));

        let debug = format!("{m:?}");
        assert!(debug.contains("FunctionMock"));
        assert!(debug.contains("log"));
    }
}
