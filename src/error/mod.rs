//! Error definitions
//!
//! This module provides error types for testkit-deferred.

use thiserror::Error;

use crate::mock::Times;

/// Main error type for testkit-deferred
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An operation was called with an invalid shape of arguments.
    #[error("Usage error: {0}")]
    Usage(String),

    /// Two values compared by an assertion differ.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    /// A mock was called in a way no expectation allowed.
    #[error("Unexpected call to {mock}: {detail}")]
    UnexpectedCall {
        /// Name of the mock.
        mock: String,
        /// What was wrong with the call.
        detail: String,
    },

    /// A mock was not called the expected number of times.
    #[error("Expected {mock} to be called {expected}, but it was called {actual} time(s)")]
    UnmetExpectation {
        /// Name of the mock.
        mock: String,
        /// Expected call count.
        expected: Times,
        /// Observed call count.
        actual: usize,
    },

    /// One or more mocks failed verification.
    #[error("{} expectation(s) failed:\n{}", .0.len(), join_errors(.0))]
    Verification(Vec<Error>),

    /// A deferred was resolved more than once.
    #[error("Deferred has already been resolved")]
    AlreadyResolved,
}

impl Error {
    /// Create a usage error.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create an unexpected call error.
    #[must_use]
    pub fn unexpected_call(mock: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedCall {
            mock: mock.into(),
            detail: detail.into(),
        }
    }

    /// Returns the individual failures, flattening a [`Error::Verification`].
    #[must_use]
    pub fn failures(&self) -> Vec<&Error> {
        match self {
            Self::Verification(errors) => errors.iter().flat_map(Error::failures).collect(),
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
