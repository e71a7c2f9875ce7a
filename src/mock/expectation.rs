//! Expectations recorded against a [`FunctionMock`](super::FunctionMock).

use std::fmt;
use std::sync::Arc;

use crate::assertions::matcher::{anything, eq, Matcher};

/// How many times an expectation allows to be called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    /// Exactly `n` calls.
    Exactly(usize),
    /// At least `n` calls.
    AtLeast(usize),
    /// At most `n` calls.
    AtMost(usize),
    /// Any number of calls, including none.
    Any,
}

impl Times {
    /// Exactly one call.
    #[must_use]
    pub const fn once() -> Self {
        Self::Exactly(1)
    }

    /// Returns `true` if `count` calls satisfy this expectation.
    #[must_use]
    pub const fn contains(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::AtMost(n) => count <= n,
            Self::Any => true,
        }
    }

    /// Returns `true` if another call after `count` calls would exceed this expectation.
    #[must_use]
    pub const fn is_saturated(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) | Self::AtMost(n) => count >= n,
            Self::AtLeast(_) | Self::Any => false,
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n} time(s)"),
            Self::AtLeast(n) => write!(f, "at least {n} time(s)"),
            Self::AtMost(n) => write!(f, "at most {n} time(s)"),
            Self::Any => f.write_str("any number of times"),
        }
    }
}

pub(crate) type Behavior<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// One expected call on a function mock.
///
/// Built with a matcher for the arguments, then refined with
/// [`times`](Self::times) and given a call behavior with
/// [`returning`](Self::returning).
///
/// ```rust
/// use testkit_deferred::mock::{CallExpectation, Times};
///
/// let expectation = CallExpectation::<(i32,), i32>::with_args((2,))
///     .times(Times::AtLeast(1))
///     .returning(|(x,)| x * 10);
/// ```
pub struct CallExpectation<A, R> {
    matcher: Box<dyn Matcher<A>>,
    times: Times,
    behavior: Option<Behavior<A, R>>,
    calls: usize,
}

impl<A: 'static, R> CallExpectation<A, R> {
    /// Expect a call with any arguments.
    #[must_use]
    pub fn any_args() -> Self {
        Self::with(anything())
    }

    /// Expect a call whose arguments deeply equal `args`.
    #[must_use]
    pub fn with_args(args: A) -> Self
    where
        A: PartialEq + fmt::Debug + Send + Sync,
    {
        Self::with(eq(args))
    }
}

impl<A, R> CallExpectation<A, R> {
    /// Expect a call whose arguments satisfy `matcher`.
    #[must_use]
    pub fn with(matcher: impl Matcher<A> + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
            times: Times::default(),
            behavior: None,
            calls: 0,
        }
    }

    /// Set how many calls are expected. Defaults to [`Times::once`].
    #[must_use]
    pub fn times(mut self, times: Times) -> Self {
        self.times = times;
        self
    }

    /// Set the behavior run for each matching call.
    #[must_use]
    pub fn returning<F>(mut self, behavior: F) -> Self
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.behavior = Some(Arc::new(behavior));
        self
    }

    /// Return `R::default()` for each matching call.
    #[must_use]
    pub fn returning_default(self) -> Self
    where
        A: 'static,
        R: Default + 'static,
    {
        self.returning(|_| R::default())
    }

    /// Expected call count.
    #[must_use]
    pub fn expected_times(&self) -> Times {
        self.times
    }

    /// Calls matched so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} ({})", self.matcher.describe(), self.times)
    }

    pub(crate) fn describe_mismatch(&self, args: &A) -> String {
        self.matcher.describe_mismatch(args)
    }

    pub(crate) fn accepts(&self, args: &A) -> bool {
        self.matcher.matches(args)
    }

    pub(crate) fn is_saturated(&self) -> bool {
        self.times.is_saturated(self.calls)
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.times.contains(self.calls)
    }

    pub(crate) fn record_call(&mut self) -> Option<Behavior<A, R>> {
        self.calls += 1;
        self.behavior.clone()
    }
}

impl<A, R> fmt::Debug for CallExpectation<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallExpectation")
            .field("matcher", &self.matcher.describe())
            .field("times", &self.times)
            .field("calls", &self.calls)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}
