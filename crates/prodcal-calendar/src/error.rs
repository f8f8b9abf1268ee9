//! Error types for annotation aggregation and calendar serialization

use thiserror::Error;

use crate::model::DateKey;

/// Result type alias for calendar operations
pub type Result<T> = std::result::Result<T, CalendarError>;

/// Error type for calendar operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// A date key does not denote a valid Gregorian date
    #[error("Malformed date key '{key}': {reason}")]
    MalformedDateKey {
        /// The offending key as received
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// An annotation is neither a holiday nor a shortened day, or is both
    #[error("Inconsistent annotation '{message}': exactly one of holiday/shortened must be set")]
    InconsistentAnnotation {
        /// Message text of the rejected annotation
        message: String,
    },

    /// Date arithmetic left the representable range
    #[error("Date out of range: no day follows {0}")]
    DateOutOfRange(DateKey),

    /// Range end precedes its start
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// First day of the range
        start: DateKey,
        /// Last day of the range
        end: DateKey,
    },

    /// Keys were pushed into an aggregator out of chronological order
    #[error("Unsorted input: {current} does not follow {previous}")]
    UnsortedInput {
        /// Last accepted key
        previous: DateKey,
        /// Rejected key
        current: DateKey,
    },

    /// A UID generator produced an empty identifier
    #[error("Generated event UID is empty")]
    EmptyUid,

    /// A UID generator produced the same identifier twice in one document
    #[error("Duplicate event UID: {0}")]
    DuplicateUid(String),

    /// Calendar text could not be read back
    #[error("Failed to parse calendar: {0}")]
    ParseError(String),
}

impl CalendarError {
    /// Create a malformed date key error
    #[inline]
    #[must_use = "returns CalendarError for malformed date keys"]
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDateKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a parse error
    #[inline]
    #[must_use = "returns CalendarError for parse failures"]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError(message.into())
    }
}
