//! A single-resolution deferred value with continuations.
//!
//! A [`Deferred`] is resolved once, either with a value ([`Deferred::resolve`])
//! or with an error ([`Deferred::reject`]). Continuations registered with
//! [`add_callback`](Deferred::add_callback), [`add_errback`](Deferred::add_errback)
//! or [`add_both`](Deferred::add_both) fire in registration order on
//! resolution; those registered afterwards fire immediately.
//!
//! The outcome can also be awaited with [`Deferred::wait`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use testkit_deferred::deferred::Deferred;
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let deferred = Deferred::<usize, String>::new();
//!
//! let sink = Arc::clone(&seen);
//! deferred.add_callback(move |n| sink.store(n, Ordering::SeqCst));
//!
//! deferred.resolve(7).unwrap();
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! assert!(deferred.resolve(8).is_err());
//! ```

mod future;

pub use future::DeferredFuture;

use std::fmt::{self, Debug};
use std::future::IntoFuture;
use std::mem;
use std::sync::Arc;
use std::task::Waker;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Error, Result};

/// Anything continuations can be attached to.
///
/// The async adapter only relies on this trait, so a test can hand it any
/// deferred-like type.
pub trait DeferredHandle<T, E> {
    /// Register a continuation run with the value on success.
    fn add_callback<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static;

    /// Register a continuation run with the error on failure.
    fn add_errback<F>(&self, errback: F)
    where
        F: FnOnce(E) + Send + 'static;
}

enum Continuation<T, E> {
    Callback(Box<dyn FnOnce(T) + Send>),
    Errback(Box<dyn FnOnce(E) + Send>),
    Both(Box<dyn FnOnce(std::result::Result<T, E>) + Send>),
}

impl<T: Clone, E: Clone> Continuation<T, E> {
    fn fire(self, outcome: &std::result::Result<T, E>) {
        match (self, outcome) {
            (Self::Callback(f), Ok(value)) => f(value.clone()),
            (Self::Errback(f), Err(err)) => f(err.clone()),
            (Self::Both(f), outcome) => f(outcome.clone()),
            (Self::Callback(_), Err(_)) | (Self::Errback(_), Ok(_)) => {}
        }
    }
}

pub(crate) struct DeferredState<T, E> {
    pub(crate) outcome: Option<std::result::Result<T, E>>,
    continuations: Vec<Continuation<T, E>>,
    pub(crate) wakers: Vec<Waker>,
}

/// A value resolved later, exactly once, to `Ok(T)` or `Err(E)`.
///
/// Cloning yields another handle to the same deferred. Continuations run on
/// the thread that resolves the deferred, with no internal lock held, so they
/// may register further continuations or resolve other deferreds.
pub struct Deferred<T, E> {
    pub(crate) state: Arc<Mutex<DeferredState<T, E>>>,
}

impl<T, E> Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Create an unresolved deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DeferredState {
                outcome: None,
                continuations: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// Create a deferred already resolved with `value`.
    #[must_use]
    pub fn succeeded(value: T) -> Self {
        let deferred = Self::new();
        deferred.state.lock().outcome = Some(Ok(value));
        deferred
    }

    /// Create a deferred already rejected with `err`.
    #[must_use]
    pub fn failed(err: E) -> Self {
        let deferred = Self::new();
        deferred.state.lock().outcome = Some(Err(err));
        deferred
    }

    /// Resolve with a value, firing success continuations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyResolved`] if the deferred already fired.
    pub fn resolve(&self, value: T) -> Result<()> {
        self.settle(Ok(value))
    }

    /// Resolve with an error, firing failure continuations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyResolved`] if the deferred already fired.
    pub fn reject(&self, err: E) -> Result<()> {
        self.settle(Err(err))
    }

    /// Register a continuation run with the value on success.
    pub fn add_callback<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.push(Continuation::Callback(Box::new(callback)));
    }

    /// Register a continuation run with the error on failure.
    pub fn add_errback<F>(&self, errback: F)
    where
        F: FnOnce(E) + Send + 'static,
    {
        self.push(Continuation::Errback(Box::new(errback)));
    }

    /// Register a continuation run with the outcome either way.
    pub fn add_both<F>(&self, continuation: F)
    where
        F: FnOnce(std::result::Result<T, E>) + Send + 'static,
    {
        self.push(Continuation::Both(Box::new(continuation)));
    }

    /// Returns `true` once the deferred has been resolved or rejected.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    /// The outcome, if the deferred has fired.
    #[must_use]
    pub fn outcome(&self) -> Option<std::result::Result<T, E>> {
        self.state.lock().outcome.clone()
    }

    /// A future completing with the outcome.
    #[must_use]
    pub fn wait(&self) -> DeferredFuture<T, E> {
        DeferredFuture::new(self.clone())
    }

    fn push(&self, continuation: Continuation<T, E>) {
        let mut state = self.state.lock();
        match state.outcome.clone() {
            Some(outcome) => {
                drop(state);
                continuation.fire(&outcome);
            }
            None => state.continuations.push(continuation),
        }
    }

    fn settle(&self, outcome: std::result::Result<T, E>) -> Result<()> {
        let (continuations, wakers) = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return Err(Error::AlreadyResolved);
            }
            state.outcome = Some(outcome.clone());
            (
                mem::take(&mut state.continuations),
                mem::take(&mut state.wakers),
            )
        };

        trace!(
            success = outcome.is_ok(),
            continuations = continuations.len(),
            "deferred fired"
        );

        // Wake waiters before continuations, which may panic on a failed
        // assertion.
        for waker in wakers {
            waker.wake();
        }
        for continuation in continuations {
            continuation.fire(&outcome);
        }
        Ok(())
    }
}

impl<T, E> DeferredHandle<T, E> for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn add_callback<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        Deferred::add_callback(self, callback);
    }

    fn add_errback<F>(&self, errback: F)
    where
        F: FnOnce(E) + Send + 'static,
    {
        Deferred::add_errback(self, errback);
    }
}

impl<T, E> Default for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> IntoFuture for Deferred<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    type Output = std::result::Result<T, E>;
    type IntoFuture = DeferredFuture<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        DeferredFuture::new(self)
    }
}

impl<T: Debug, E: Debug> Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Deferred")
            .field("outcome", &state.outcome)
            .field("continuations", &state.continuations.len())
            .finish()
    }
}
