//! Error types for the handler toolkit.
//!
//! Handlers never surface these errors to HTTP clients directly: malformed
//! input degrades to a pass-through or a not-found response, and pool failures
//! become a `500`. The variants exist so that callers of the lower-level APIs
//! ([`parse_duration`], [`Pace::submit`], [`Pace::try_handle`]) can tell what
//! went wrong.
//!
//! ## Error Cases
//! - `InvalidDuration`: a path token is not a duration.
//! - `QueueClosed`: the pool's work queue no longer accepts items.
//! - `WorkerDropped`: a worker went away without completing an item.
//!
//! [`parse_duration`]: crate::parse_duration
//! [`Pace::submit`]: crate::Pace::submit
//! [`Pace::try_handle`]: crate::Pace::try_handle

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the handler toolkit.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The input could not be parsed as a duration.
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: &'static str },

    /// The work queue was closed before the item could be pushed.
    #[error("work queue closed")]
    QueueClosed,

    /// The completion signal was dropped without a response.
    #[error("worker dropped the request before responding")]
    WorkerDropped,
}

impl Error {
    pub(crate) fn invalid_duration(input: &str, reason: &'static str) -> Self {
        Self::InvalidDuration {
            input: input.to_string(),
            reason,
        }
    }
}
