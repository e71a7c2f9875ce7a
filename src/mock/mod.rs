//! Mock controller and function mocks.
//!
//! This module provides the expectation recorder the async adapter builds on:
//!
//! - [`MockControl`] - Owns the mocks of one test and verifies them together
//! - [`FunctionMock`] - A named mock standing in for a function
//! - [`CallExpectation`] - One expected call: argument matcher, count, behavior
//! - [`Verifiable`] - What the controller needs from anything it verifies
//!
//! # Record, replay, verify
//!
//! ```rust
//! use testkit_deferred::mock::{CallExpectation, MockControl, Times};
//!
//! let control = MockControl::new();
//! let fetch = control.create_function_mock::<(String,), usize>("fetch");
//!
//! // record
//! fetch.expect(
//!     CallExpectation::with_args(("index.html".to_string(),))
//!         .times(Times::AtLeast(1))
//!         .returning(|(path,)| path.len()),
//! );
//!
//! // replay
//! control.replay_all();
//! assert_eq!(fetch.call(("index.html".to_string(),)), 10);
//!
//! // verify
//! control.verify_all().unwrap();
//! ```

mod control;
mod expectation;
mod function_mock;

pub use control::MockControl;
pub use expectation::{CallExpectation, Times};
pub use function_mock::{CallRecord, FunctionMock};

use crate::error::Result;

/// Something the [`MockControl`] can replay, verify and reset.
///
/// [`FunctionMock`] is the built-in implementation. Custom test doubles can
/// implement this trait and join a controller with
/// [`MockControl::register`].
pub trait Verifiable: Send + Sync {
    /// Name used in failure messages.
    fn name(&self) -> &str;

    /// Switch from the record phase to the replay phase.
    fn replay(&self);

    /// Check that every expectation was met.
    ///
    /// # Errors
    ///
    /// Returns the failures found, aggregated as
    /// [`Error::Verification`](crate::Error::Verification) when there are
    /// several.
    fn verify(&self) -> Result<()>;

    /// Return to the record phase, forgetting expectations and calls.
    fn reset(&self);
}
