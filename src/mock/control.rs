//! The mock controller owning every mock created during a test.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{FunctionMock, Verifiable};
use crate::error::{Error, Result};

/// Records mocks and verifies all of their expectations at once.
///
/// A `MockControl` is scoped to one test case. Cloning yields another handle
/// to the same controller, which lets continuations register follow-up mocks
/// while the test runs.
///
/// # Example
///
/// ```rust
/// use testkit_deferred::mock::{CallExpectation, MockControl};
///
/// let control = MockControl::new();
/// let on_done = control.create_function_mock::<(), ()>("on_done");
/// on_done.expect(CallExpectation::any_args().returning_default());
/// control.replay_all();
///
/// assert!(control.verify_all().is_err());
/// on_done.call(());
/// assert!(control.verify_all().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct MockControl {
    mocks: Arc<Mutex<Vec<Arc<dyn Verifiable>>>>,
}

impl MockControl {
    /// Create an empty controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a function mock registered under `name`.
    ///
    /// The mock starts in the record phase.
    pub fn create_function_mock<A, R>(&self, name: impl Into<String>) -> FunctionMock<A, R>
    where
        A: Debug + Clone + Send + 'static,
        R: 'static,
    {
        let mock = FunctionMock::new(name.into());
        debug!(mock = mock.name(), "created function mock");
        self.register(mock.as_verifiable());
        mock
    }

    /// Register a custom [`Verifiable`] so that it takes part in
    /// [`replay_all`](Self::replay_all), [`verify_all`](Self::verify_all) and
    /// [`reset_all`](Self::reset_all).
    pub fn register(&self, mock: Arc<dyn Verifiable>) {
        self.mocks.lock().push(mock);
    }

    /// Mark every registered mock ready for use.
    pub fn replay_all(&self) {
        let mocks = self.snapshot();
        debug!(count = mocks.len(), "replaying all mocks");
        for mock in mocks {
            mock.replay();
        }
    }

    /// Verify every registered mock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Verification`] listing each unmet expectation and
    /// each unexpected call across all mocks.
    pub fn verify_all(&self) -> Result<()> {
        let mocks = self.snapshot();
        debug!(count = mocks.len(), "verifying all mocks");

        let failures: Vec<Error> = mocks
            .iter()
            .filter_map(|mock| mock.verify().err())
            .flat_map(|err| err.failures().into_iter().cloned().collect::<Vec<_>>())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(failures = failures.len(), "mock verification failed");
            Err(Error::Verification(failures))
        }
    }

    /// Return every mock to the record phase with no expectations or calls.
    pub fn reset_all(&self) {
        let mocks = self.snapshot();
        debug!(count = mocks.len(), "resetting all mocks");
        for mock in mocks {
            mock.reset();
        }
    }

    /// Number of registered mocks.
    #[must_use]
    pub fn mock_count(&self) -> usize {
        self.mocks.lock().len()
    }

    /// Names of registered mocks, in registration order.
    #[must_use]
    pub fn mock_names(&self) -> Vec<String> {
        self.mocks
            .lock()
            .iter()
            .map(|mock| mock.name().to_string())
            .collect()
    }

    // Verifiable calls run without the registry lock, since a mock may
    // register further mocks while it is being replayed or verified.
    fn snapshot(&self) -> Vec<Arc<dyn Verifiable>> {
        self.mocks.lock().clone()
    }
}

impl Debug for MockControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockControl")
            .field("mocks", &self.mock_names())
            .finish()
    }
}
