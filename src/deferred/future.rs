//! Awaiting a [`Deferred`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::Deferred;

/// A future completing with the outcome of a [`Deferred`].
///
/// Created by [`Deferred::wait`] or by awaiting the deferred directly.
///
/// ```rust
/// use testkit_deferred::deferred::Deferred;
///
/// let deferred = Deferred::<u8, ()>::new();
/// let waiting = deferred.wait();
/// deferred.resolve(1).unwrap();
///
/// assert_eq!(futures::executor::block_on(waiting), Ok(1));
/// ```
pub struct DeferredFuture<T, E> {
    deferred: Deferred<T, E>,
}

impl<T, E> DeferredFuture<T, E> {
    pub(crate) fn new(deferred: Deferred<T, E>) -> Self {
        Self { deferred }
    }
}

impl<T: Clone, E: Clone> Future for DeferredFuture<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.deferred.state.lock();
        if let Some(outcome) = &state.outcome {
            return Poll::Ready(outcome.clone());
        }

        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T, E> fmt::Debug for DeferredFuture<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredFuture")
            .field("fired", &self.deferred.state.lock().outcome.is_some())
            .finish()
    }
}
