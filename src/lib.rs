//! # testkit-deferred
//!
//! > Callback mocks and deferred assertions for async Rust tests
//!
//! **testkit-deferred** records the callbacks a test expects to fire and the
//! values deferred results should produce, then checks everything in one
//! explicit verify step.
//!
//! ## Quick Start
//!
//! ```rust
//! use testkit_deferred::prelude::*;
//!
//! let control = MockControl::new();
//! let async_mock = AsyncMockControl::new(&control);
//!
//! let response = Deferred::<u16, String>::new();
//! async_mock
//!     .assert_deferred_equals("status", DeferredOr::value(200), &response)
//!     .unwrap();
//!
//! let on_headers = async_mock.async_assert_equals("headers", ("content-type", "text/html"));
//! on_headers(("content-type", "text/html"));
//!
//! response.resolve(200).unwrap();
//! control.verify_all().unwrap();
//! ```
//!
//! ## Features
//!
//! - **Mock Control** - Named function mocks, verified together
//! - **Callback Mocks** - Functions that must be called exactly once
//! - **Deferred** - Single-resolution values with success and failure continuations
//! - **Deferred Assertions** - Compare resolved values, expect failures
//! - **Test Macro** - A controller per test, verified when the test ends

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assertions;
pub mod async_mock;
pub mod deferred;
pub mod error;
pub mod mock;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_deferred::prelude::*;
/// ```
pub mod prelude {
    pub use crate::assertions::assert_equals;
    pub use crate::async_mock::{AsyncMockControl, DeferredOr};
    pub use crate::deferred::{Deferred, DeferredHandle};
    pub use crate::error::{Error, Result};
    pub use crate::mock::{CallExpectation, FunctionMock, MockControl, Times};
}

// Re-exports
pub use error::{Error, Result};

// Re-export the test macro when macros feature is enabled
#[cfg(feature = "macros")]
pub use testkit_deferred_macros::test;
