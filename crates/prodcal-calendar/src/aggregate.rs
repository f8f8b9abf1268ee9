//! Merging annotated days into contiguous ranges
//!
//! Days merge when they are calendar neighbours and carry the same message
//! and the same category. Input order never matters: [`aggregate_ranges`]
//! sorts the keys before walking them.

use crate::error::{CalendarError, Result};
use crate::model::{Annotation, AnnotationMap, DateKey, DateRange};

/// Incremental range builder over chronologically ascending days
#[derive(Debug, Default)]
pub struct RangeAggregator {
    closed: Vec<DateRange>,
    open: Option<DateRange>,
}

impl RangeAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next annotated day
    ///
    /// # Errors
    ///
    /// Returns `CalendarError::UnsortedInput` if `key` is not after the
    /// previously pushed day.
    pub fn push(&mut self, key: DateKey, annotation: &Annotation) -> Result<()> {
        if let Some(open) = &self.open {
            if key <= open.end() {
                return Err(CalendarError::UnsortedInput {
                    previous: open.end(),
                    current: key,
                });
            }
        }
        self.append(key, annotation);
        Ok(())
    }

    /// Add a day known to be after every day pushed so far
    fn append(&mut self, key: DateKey, annotation: &Annotation) {
        if let Some(open) = self.open.as_mut() {
            debug_assert!(key > open.end(), "days must be appended in ascending order");
            if open.accepts(key, annotation) {
                open.extend_to(key);
                return;
            }
        }

        if let Some(done) = self.open.replace(DateRange::single_day(key, annotation)) {
            self.closed.push(done);
        }
    }

    /// Close the range in progress and return all ranges in order
    #[must_use]
    pub fn finish(mut self) -> Vec<DateRange> {
        if let Some(open) = self.open.take() {
            self.closed.push(open);
        }
        self.closed
    }
}

/// Merge every annotated day of `annotations` into ordered ranges
///
/// The result covers exactly the input days, ranges do not overlap and are
/// sorted by start.
#[must_use]
pub fn aggregate_ranges(annotations: &AnnotationMap) -> Vec<DateRange> {
    let mut aggregator = RangeAggregator::new();
    // Map keys are unique, so the sorted walk is strictly ascending
    for (key, annotation) in annotations.sorted_entries() {
        aggregator.append(key, annotation);
    }

    let ranges = aggregator.finish();
    log::debug!(
        "Aggregated {} annotated days into {} ranges",
        annotations.len(),
        ranges.len()
    );
    ranges
}
