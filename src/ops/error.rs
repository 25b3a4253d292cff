//! Error types for the collection algorithms.

use crate::model::error::Error as RecordError;
use thiserror::Error;

/// Errors raised by [`uniquify`](super::uniquify::uniquify) and the interval
/// helpers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A record-level failure surfaced while running an algorithm.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Collisions remain after the pass limit, or the leading identity field
    /// cannot be incremented.
    #[error(
        "uniquification over [{fields}] gave up after {passes} pass(es) with {collisions} colliding record(s): {reason}"
    )]
    UniquificationExhausted {
        /// Identity fields, comma separated.
        fields: String,
        /// Passes completed.
        passes: usize,
        /// Records still sharing a key with another record.
        collisions: usize,
        /// Description of the failure.
        reason: String,
    },

    /// Uniquification was asked to run without identity fields.
    #[error("uniquification needs at least one identity field")]
    NoIdentityFields,

    /// An attribute is listed both as identity and as make-common field.
    #[error("attribute '{0}' cannot be both an identity and a make-common field")]
    OverlappingFields(String),

    /// A record of the interval kind does not hold a valid interval.
    #[error("malformed state interval: {0}")]
    MalformedInterval(String),
}

impl Error {
    pub fn exhausted(
        fields: &[&str],
        passes: usize,
        collisions: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::UniquificationExhausted {
            fields: fields.join(", "),
            passes,
            collisions,
            reason: reason.into(),
        }
    }

    pub fn malformed_interval(details: impl Into<String>) -> Self {
        Self::MalformedInterval(details.into())
    }
}
