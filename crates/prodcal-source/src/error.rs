//! Error types for page retrieval and annotation extraction

use std::path::{Path, PathBuf};

use prodcal_calendar::CalendarError;
use thiserror::Error;

/// Result type alias for source operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Error type for source operations
#[derive(Error, Debug)]
pub enum SourceError {
    /// Request could not be sent or its body not read
    #[error("Request to {url} failed: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying transport error
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status
        status: reqwest::StatusCode,
    },

    /// Saved page could not be read
    #[error("Failed to read page {path}: {source}")]
    Read {
        /// Path to the page
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A CSS selector failed to compile
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// The page contains no month tables
    #[error("No calendar tables found in page")]
    NoCalendarTables,

    /// The page contains more month tables than a year has months
    #[error("Found {0} month tables, expected at most 12")]
    TooManyMonths(usize),

    /// An annotated cell does not hold a day number
    #[error("Month {month}: annotated cell '{text}' is not a day number")]
    BadDayNumber {
        /// Month the cell belongs to (1-12)
        month: u32,
        /// Cell text
        text: String,
    },

    /// Extracted data violates a calendar invariant
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl SourceError {
    /// Create a read error
    #[inline]
    #[must_use = "returns SourceError for file read failures"]
    pub fn read_error<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
