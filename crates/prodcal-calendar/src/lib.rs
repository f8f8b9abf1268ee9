//! # prodcal-calendar
//!
//! Turns per-day production calendar annotations into an iCalendar file.
//!
//! The pipeline is pure and synchronous:
//!
//! 1. An [`AnnotationMap`] holds one [`Annotation`] per special day
//!    (a holiday or a shortened working day).
//! 2. [`aggregate_ranges`] sorts the days and merges calendar neighbours
//!    sharing the same message into [`DateRange`]s.
//! 3. [`IcsWriter`] renders the ranges as one all-day `VEVENT` each.
//!
//! ## Quick Start
//!
//! ```
//! use prodcal_calendar::{render_calendar, Annotation, AnnotationMap, CalendarHeader, RandomUid};
//!
//! let days = AnnotationMap::from_raw([
//!     ("2026-02-23", Annotation::holiday("День защитника Отечества")),
//!     ("2026-03-07", Annotation::shortened("Сокращённый рабочий день")),
//! ])?;
//!
//! let ics = render_calendar(&days, &CalendarHeader::for_year(2026), &mut RandomUid::new())?;
//! assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
//! # Ok::<(), prodcal_calendar::CalendarError>(())
//! ```
//!
//! ## Output Format
//!
//! | Line | Value |
//! |------|-------|
//! | `PRODID` | [`CalendarHeader::prod_id`] |
//! | `X-WR-CALNAME`, `NAME` | [`CalendarHeader::name`] |
//! | `SUMMARY` | range message, TEXT-escaped |
//! | `DTSTART;VALUE=DATE` | first day, `YYYYMMDD` |
//! | `DTEND;VALUE=DATE` | day after the last day, `YYYYMMDD` |
//! | `UID` | from a [`UidGenerator`] |
//!
//! Lines are separated by a single `\n`.
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`CalendarError`]. Malformed date keys
//! abort the run; an empty map is not an error and yields a calendar with
//! no events.

pub mod aggregate;
pub mod error;
pub mod ics;
pub mod model;
pub mod template;
pub mod uid;

pub use aggregate::{aggregate_ranges, RangeAggregator};
pub use error::{CalendarError, Result};
pub use ics::{
    parse_document, render_calendar, CalendarHeader, IcsOptions, IcsWriter, ParsedCalendar,
    ParsedEvent,
};
pub use model::{Annotation, AnnotationKind, AnnotationMap, CalendarEvent, DateKey, DateRange};
pub use uid::{RandomUid, SequentialUid, UidGenerator};
