//! Error types for servicemux.
//!
//! The taxonomy is deliberately small:
//!
//! - [`MuxError::MissingParameter`] and [`MuxError::UnsupportedType`] are
//!   raised synchronously at the call site and always propagate.
//! - [`MuxError::Pattern`] rejects an invalid URI template at registration.
//! - [`MuxError::Handler`] wraps a failure inside a handler chain; it is the
//!   only recoverable class, funneled through the `error` notice (see
//!   [`Observers`]).
//!
//! [`Observers`]: crate::Observers

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all servicemux operations.
#[derive(Error, Debug)]
pub enum MuxError {
    /// A required field was absent: URI, handler, mount target, registry.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// No transport factory is registered for the requested protocol.
    #[error("unsupported transport type: {0}")]
    UnsupportedType(String),

    /// A URI template could not be compiled into a matcher.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    Pattern {
        /// The offending template.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A handler failed during dispatch. Carries the original cause.
    #[error("handler failed")]
    Handler(#[source] BoxError),
}

impl MuxError {
    /// Wrap an arbitrary error as a handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        MuxError::Handler(err.into())
    }

    /// Whether this error may be recovered by an `error` observer.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MuxError::Handler(_))
    }
}

// Convenience conversion
impl From<BoxError> for MuxError {
    fn from(err: BoxError) -> Self {
        MuxError::Handler(err)
    }
}
