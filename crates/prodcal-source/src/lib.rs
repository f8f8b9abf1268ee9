//! # prodcal-source
//!
//! Supplies day annotations for `prodcal-calendar` from a production
//! calendar web page.
//!
//! ```no_run
//! use prodcal_source::{load_annotations, ExtractOptions, FetchOptions, Fetcher};
//!
//! let fetcher = Fetcher::new(FetchOptions::default())?;
//! let days = load_annotations(&fetcher, 2026, &ExtractOptions::default())?;
//! println!("{} special days", days.len());
//! # Ok::<(), prodcal_source::SourceError>(())
//! ```

pub mod error;
pub mod extract;
pub mod fetch;

pub use error::{Result, SourceError};
pub use extract::{extract_annotations, ExtractOptions};
pub use fetch::{load_file, year_url, FetchOptions, Fetcher, PageSource, SavedPage};

use prodcal_calendar::AnnotationMap;

/// Obtain the page for `year` from `source` and extract its annotations
///
/// # Errors
///
/// Propagates retrieval and extraction errors.
pub fn load_annotations<S: PageSource + ?Sized>(
    source: &S,
    year: i32,
    options: &ExtractOptions,
) -> Result<AnnotationMap> {
    let html = source.page(year)?;
    extract_annotations(&html, year, options)
}
